#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]

mod context;
mod error;
mod expression;
mod random;
mod results;
mod row;
mod rowsource;
mod source;
mod translate;
mod value;
mod variables;
mod world;

pub use crate::error::{EvaluationError, ExpressionError};
pub use crate::random::RandomState;
pub use crate::results::{format_integer, rowsource_from_solutions, QueryResults, ResultsKind};
pub use crate::row::Row;
pub use crate::rowsource::{Requirements, RowSource};
pub use crate::source::{
    DataGraph, DataGraphKind, GraphData, MemoryTriplesSource, SourceError, SourceFeature,
    SourceFlags, TriplePartsMask, TripleQuery, TriplesMatch, TriplesSource, TriplesSourceFactory,
    TRIPLES_SOURCE_API_MAX, TRIPLES_SOURCE_API_MIN,
};
pub use crate::value::Numeric;
pub use crate::variables::VariableTable;
pub use crate::world::World;
