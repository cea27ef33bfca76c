#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]

mod csv;
mod error;
mod format;
mod json;
mod parser;
mod serializer;
mod solution;
mod xml;

pub use crate::error::{QueryResultsParseError, QueryResultsSyntaxError};
pub use crate::format::{FormatDirection, FormatEntry, FormatRegistry, QueryResultsFormat};
pub use crate::parser::{ParsedQueryResults, ResultsParser, SolutionsReader};
pub use crate::serializer::{ResultsSerializer, SolutionsWriter};
pub use crate::solution::{QuerySolution, VariableSolutionIndex};
