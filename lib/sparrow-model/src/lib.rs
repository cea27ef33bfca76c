#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]

mod blank_node;
mod dataset;
mod literal;
mod named_node;
mod term;
mod variable;
pub mod vocab;
pub mod xsd;

pub use crate::blank_node::{BlankNode, BlankNodeIdParseError};
pub use crate::dataset::Dataset;
pub use crate::literal::Literal;
pub use crate::named_node::{IriParseError, NamedNode, NamedNodeRef};
pub use crate::term::{GraphName, NamedOrBlankNode, Quad, Term, Triple};
pub use crate::variable::{Variable, VariableNameParseError};
