//! Variable references of XPath expressions.
//!
//! A [VariableReference] is parsed from its text within a
//! [ReferenceContext], which supplies name expansion and optionally a
//! [Resolver]. Resolution is deferred until asked for, and the context
//! decides what a reference resolves to.

mod context;
mod errors;
mod name;
mod reference;
mod variable;

pub use context::{NoContext, ReferenceContext, Resolver, StaticContext};
pub use errors::Error;
pub use name::{PrefixedName, QName};
pub use reference::VariableReference;
pub use variable::{Element, Variable, XPathType};
