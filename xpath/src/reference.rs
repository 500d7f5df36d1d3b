use smol_str::SmolStr;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Range;
use std::sync::Arc;
use tracing::debug;

use crate::context::ReferenceContext;
use crate::name::{PrefixedName, QName};
use crate::variable::{Element, Variable, XPathType};
use crate::Error;

/// A `$name` or `$prefix:name` occurrence in an expression.
///
/// Equality has two modes. A reference that resolves is equal to another
/// reference iff that one resolves to the very same declaration. An
/// unresolved reference compares by expanded name when its context can
/// expand it, and by the referenced name as written otherwise.
///
/// The two modes don't mix symmetrically: an unresolved `$x` can equal a
/// resolved `$x` while the resolved one never equals it back. Keep map and
/// set keys to references from a single context.
#[derive(Clone)]
pub struct VariableReference {
    text: SmolStr,
    name: PrefixedName,
    offset: usize,
    context: Arc<dyn ReferenceContext>,
}

impl VariableReference {
    /// Parses `text`, found at `offset` in the enclosing expression.
    pub fn parse(
        text: &str,
        offset: usize,
        context: Arc<dyn ReferenceContext>,
    ) -> Result<Self, Error> {
        let name = text
            .strip_prefix('$')
            .ok_or_else(|| Error::NotAReference(text.to_owned()))?;
        let name = PrefixedName::parse(name)?;

        Ok(Self {
            text: text.into(),
            name,
            offset,
            context,
        })
    }

    /// The name without the leading `$`, prefix included.
    pub fn referenced_name(&self) -> &str {
        &self.text[1..]
    }

    pub fn qualified_name(&self) -> &PrefixedName {
        &self.name
    }

    /// The expanded name, if the context knows the prefix.
    pub fn qname(&self) -> Option<QName> {
        self.context.qname(self)
    }

    /// The type of the declaration, [XPathType::Unknown] if unresolved.
    pub fn ty(&self) -> XPathType {
        self.resolve()
            .map(|v| v.ty())
            .unwrap_or(XPathType::Unknown)
    }

    /// Range of the whole reference in the enclosing expression.
    pub fn text_range(&self) -> Range<usize> {
        self.offset..self.offset + self.text.len()
    }

    /// Offset of the name in the enclosing expression, after the `$`.
    pub fn text_offset(&self) -> usize {
        self.offset + 1
    }

    /// Range of the name relative to the start of the reference.
    pub fn range_in_element(&self) -> Range<usize> {
        1..self.text.len()
    }

    pub fn canonical_text(&self) -> &str {
        &self.text
    }

    pub fn resolve(&self) -> Option<Arc<Variable>> {
        self.context.resolver()?.resolve(self)
    }

    /// Renames the reference to `new_name`.
    ///
    /// Only the local part changes: the prefix as written is kept, and a
    /// prefix in `new_name` is ignored.
    pub fn handle_element_rename(&mut self, new_name: &str) -> Result<(), Error> {
        let new_name = PrefixedName::parse(new_name)?;
        let name = self
            .name
            .with_local(SmolStr::from(new_name.local_name()));

        debug!(from = %self.name, to = %name, "renaming variable reference");
        self.text = format!("${name}").into();
        self.name = name;
        Ok(())
    }

    /// Makes the reference refer to `element`, by renaming it to the
    /// element's name.
    pub fn bind_to_element(&mut self, element: &Element) -> Result<(), Error> {
        self.handle_element_rename(&element.name())
    }

    /// Whether this reference refers to `element`.
    pub fn is_reference_to(&self, element: &Element) -> bool {
        match element {
            Element::Variable(variable) => {
                self.referenced_name() == variable.name().to_string()
                    && self
                        .resolve()
                        .is_some_and(|resolved| Arc::ptr_eq(&resolved, variable))
            }
            Element::Other(_) => self
                .context
                .resolver()
                .is_some_and(|resolver| resolver.is_reference_to(element, self)),
        }
    }

    /// Completion variants. References offer none.
    pub fn variants(&self) -> &[Arc<Variable>] {
        &[]
    }

    /// Unresolved references are not errors.
    pub fn is_soft(&self) -> bool {
        true
    }
}

impl PartialEq for VariableReference {
    fn eq(&self, other: &Self) -> bool {
        if let Some(variable) = self.resolve() {
            return other
                .resolve()
                .is_some_and(|resolved| Arc::ptr_eq(&variable, &resolved));
        }

        if let Some(qname) = self.qname() {
            return other.qname().as_ref() == Some(&qname);
        }

        self.referenced_name() == other.referenced_name()
    }
}

impl Eq for VariableReference {}

impl Hash for VariableReference {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self.qname() {
            Some(qname) => qname.hash(state),
            None => self.referenced_name().hash(state),
        }
    }
}

impl fmt::Debug for VariableReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariableReference")
            .field("text", &self.text)
            .field("offset", &self.offset)
            .finish()
    }
}

impl fmt::Display for VariableReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
