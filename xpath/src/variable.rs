use smol_str::SmolStr;
use std::fmt;
use std::sync::Arc;

use crate::name::{PrefixedName, QName};

/// Static type of an XPath 1.0 expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum XPathType {
    #[default]
    Unknown,
    Any,
    Boolean,
    Number,
    String,
    NodeSet,
}

impl fmt::Display for XPathType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            XPathType::Unknown => "unknown",
            XPathType::Any => "any",
            XPathType::Boolean => "boolean",
            XPathType::Number => "number",
            XPathType::String => "string",
            XPathType::NodeSet => "node-set",
        })
    }
}

/// A declared variable.
///
/// Declarations are handed out as `Arc<Variable>`, and two declarations are
/// the same variable only if they are the same allocation. Two declarations
/// with the same name in different scopes are different variables.
#[derive(Debug)]
pub struct Variable {
    name: PrefixedName,
    qname: QName,
    ty: XPathType,
}

impl Variable {
    pub fn new(name: PrefixedName, qname: QName, ty: XPathType) -> Arc<Self> {
        Arc::new(Self { name, qname, ty })
    }

    /// The name as written in the declaration.
    pub fn name(&self) -> &PrefixedName {
        &self.name
    }

    pub fn qname(&self) -> &QName {
        &self.qname
    }

    pub fn ty(&self) -> XPathType {
        self.ty
    }
}

/// Something a reference can be checked against, or bound to.
#[derive(Debug, Clone)]
pub enum Element {
    /// A variable declaration.
    Variable(Arc<Variable>),
    /// Any other named element, only known to the resolver.
    Other(SmolStr),
}

impl Element {
    pub fn name(&self) -> SmolStr {
        match self {
            Element::Variable(v) => v.name().to_string().into(),
            Element::Other(name) => name.clone(),
        }
    }
}
