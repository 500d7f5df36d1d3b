//! Resolution of variable references.
//!
//! A [VariableReference] doesn't know how to resolve itself. It is parsed
//! within a [ReferenceContext], which expands its name and may provide a
//! [Resolver]. [StaticContext] is a context with namespace bindings and
//! nested variable scopes.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use std::sync::Arc;
use tracing::trace;

use crate::name::{PrefixedName, QName};
use crate::variable::{Element, Variable, XPathType};
use crate::{Error, VariableReference};

/// Finds the declaration a reference points to.
pub trait Resolver: Send + Sync {
    fn resolve(&self, reference: &VariableReference) -> Option<Arc<Variable>>;

    /// Whether `reference` refers to `element`, for elements that aren't
    /// variable declarations.
    fn is_reference_to(&self, _element: &Element, _reference: &VariableReference) -> bool {
        false
    }
}

/// Everything a [VariableReference] needs from its surroundings.
pub trait ReferenceContext: Send + Sync {
    /// The resolver, if references can be resolved in this context.
    fn resolver(&self) -> Option<&dyn Resolver>;

    /// Expands the name of `reference`, if its prefix is known.
    fn qname(&self, reference: &VariableReference) -> Option<QName>;
}

/// A context without resolver, expanding unprefixed names only.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoContext;

impl ReferenceContext for NoContext {
    fn resolver(&self) -> Option<&dyn Resolver> {
        None
    }

    fn qname(&self, reference: &VariableReference) -> Option<QName> {
        let name = reference.qualified_name();
        match name.prefix() {
            None => Some(QName::local(name.local_name())),
            Some(_) => None,
        }
    }
}

/// Namespace bindings and variable declarations of one scope, plus those of
/// all enclosing scopes.
///
/// Lookups check the innermost scope first, so inner declarations shadow
/// outer ones with the same expanded name.
#[derive(Debug, Default)]
pub struct StaticContext {
    parent: Option<Arc<StaticContext>>,
    namespaces: FxHashMap<SmolStr, SmolStr>,
    variables: FxHashMap<QName, Arc<Variable>>,
}

impl StaticContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a scope nested in `parent`.
    pub fn nested(parent: Arc<StaticContext>) -> Self {
        Self {
            parent: Some(parent),
            ..Default::default()
        }
    }

    /// Binds `prefix` to a namespace URI in this scope.
    pub fn bind_namespace(&mut self, prefix: impl Into<SmolStr>, uri: impl Into<SmolStr>) {
        self.namespaces.insert(prefix.into(), uri.into());
    }

    /// Looks up the namespace URI bound to `prefix`.
    pub fn namespace(&self, prefix: &str) -> Option<&SmolStr> {
        match self.namespaces.get(prefix) {
            Some(uri) => Some(uri),
            None => self.parent.as_ref()?.namespace(prefix),
        }
    }

    /// Expands a written name. Unprefixed names have no namespace.
    pub fn expand(&self, name: &PrefixedName) -> Result<QName, Error> {
        match name.prefix() {
            None => Ok(QName::local(name.local_name())),
            Some(prefix) => {
                let uri = self
                    .namespace(prefix)
                    .ok_or_else(|| Error::UnboundPrefix(prefix.into()))?;
                Ok(QName::new(uri.clone(), name.local_name()))
            }
        }
    }

    /// Declares a variable in this scope.
    pub fn declare(&mut self, name: &str, ty: XPathType) -> Result<Arc<Variable>, Error> {
        let name = PrefixedName::parse(name)?;
        let qname = self.expand(&name)?;
        if self.variables.contains_key(&qname) {
            return Err(Error::AlreadyDeclared(name.to_string()));
        }

        let variable = Variable::new(name, qname.clone(), ty);
        self.variables.insert(qname, variable.clone());
        Ok(variable)
    }

    /// Looks up a variable by its expanded name.
    pub fn lookup(&self, qname: &QName) -> Option<&Arc<Variable>> {
        match self.variables.get(qname) {
            Some(variable) => Some(variable),
            None => self.parent.as_ref()?.lookup(qname),
        }
    }
}

impl Resolver for StaticContext {
    fn resolve(&self, reference: &VariableReference) -> Option<Arc<Variable>> {
        let qname = self.expand(reference.qualified_name()).ok()?;
        let found = self.lookup(&qname).cloned();
        trace!(name = %qname, found = found.is_some(), "resolving variable");
        found
    }
}

impl ReferenceContext for StaticContext {
    fn resolver(&self) -> Option<&dyn Resolver> {
        Some(self)
    }

    fn qname(&self, reference: &VariableReference) -> Option<QName> {
        self.expand(reference.qualified_name()).ok()
    }
}
