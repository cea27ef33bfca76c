#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]

mod algebra;
mod expression;
mod query;
mod term;

pub use crate::algebra::GraphPattern;
pub use crate::expression::{
    AggregateExpression, AggregateFunction, Expression, Function, OrderExpression, PatternLiteral,
};
pub use crate::query::Query;
pub use crate::term::{NamedNodePattern, TermPattern, TriplePattern};
