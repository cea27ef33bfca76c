use crate::csv::{TsvQueryResultsReader, TsvSolutionsReader};
use crate::error::{QueryResultsParseError, QueryResultsSyntaxError};
use crate::format::QueryResultsFormat;
use crate::json::{solution_from_pairs, JsonQueryResultsReader};
use crate::solution::QuerySolution;
use crate::xml::{XmlQueryResultsReader, XmlSolutionsReader};
use sparrow_model::{Term, Variable};
use std::io::Read;
use std::sync::Arc;

/// A parser for [SPARQL query](https://www.w3.org/TR/sparql11-query/) results files.
///
/// Reading is supported for the XML, JSON and TSV formats; CSV is write-only
/// because its term serialization is lossy.
///
/// ```
/// use sparrow_results::{ParsedQueryResults, QueryResultsFormat, ResultsParser};
///
/// let parser = ResultsParser::new(QueryResultsFormat::Tsv);
/// if let ParsedQueryResults::Solutions(solutions) = parser.parse_read(&b"?x\n1\n"[..])? {
///     assert_eq!(solutions.count(), 1);
/// }
/// # Result::<_, sparrow_results::QueryResultsParseError>::Ok(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ResultsParser {
    format: QueryResultsFormat,
}

impl ResultsParser {
    #[inline]
    pub fn new(format: QueryResultsFormat) -> Self {
        Self { format }
    }

    #[inline]
    pub fn format(&self) -> QueryResultsFormat {
        self.format
    }

    /// Parses a results document from a [`Read`] implementation.
    pub fn parse_read<R: Read>(
        &self,
        read: R,
    ) -> Result<ParsedQueryResults<R>, QueryResultsParseError> {
        Ok(match self.format {
            QueryResultsFormat::Xml => match XmlQueryResultsReader::read(read)? {
                XmlQueryResultsReader::Boolean(value) => ParsedQueryResults::Boolean(value),
                XmlQueryResultsReader::Solutions(reader) => {
                    ParsedQueryResults::Solutions(SolutionsReader {
                        variables: Arc::clone(reader.variables()),
                        inner: InnerSolutionsReader::Xml(reader),
                    })
                }
            },
            QueryResultsFormat::Json => match JsonQueryResultsReader::read(read)? {
                JsonQueryResultsReader::Boolean(value) => ParsedQueryResults::Boolean(value),
                JsonQueryResultsReader::Solutions {
                    variables,
                    solutions,
                } => ParsedQueryResults::Solutions(SolutionsReader {
                    variables,
                    inner: InnerSolutionsReader::Json(solutions),
                }),
            },
            QueryResultsFormat::Csv => {
                return Err(QueryResultsSyntaxError::msg(
                    "The CSV results format cannot be parsed, use TSV instead",
                )
                .into());
            }
            QueryResultsFormat::Tsv => match TsvQueryResultsReader::read(read)? {
                TsvQueryResultsReader::Boolean(value) => ParsedQueryResults::Boolean(value),
                TsvQueryResultsReader::Solutions(reader) => {
                    ParsedQueryResults::Solutions(SolutionsReader {
                        variables: Arc::clone(reader.variables()),
                        inner: InnerSolutionsReader::Tsv(reader),
                    })
                }
            },
        })
    }
}

impl From<QueryResultsFormat> for ResultsParser {
    #[inline]
    fn from(format: QueryResultsFormat) -> Self {
        Self::new(format)
    }
}

/// The results of a parsed document: a boolean or an iterator of solutions.
pub enum ParsedQueryResults<R: Read> {
    Solutions(SolutionsReader<R>),
    Boolean(bool),
}

/// An iterator of [`QuerySolution`]s read from a results document.
pub struct SolutionsReader<R: Read> {
    variables: Arc<[Variable]>,
    inner: InnerSolutionsReader<R>,
}

enum InnerSolutionsReader<R: Read> {
    Xml(XmlSolutionsReader<R>),
    Json(std::vec::IntoIter<Vec<(String, Term)>>),
    Tsv(TsvSolutionsReader<R>),
}

impl<R: Read> SolutionsReader<R> {
    /// The ordered list of the declared variables.
    #[inline]
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }
}

impl<R: Read> Iterator for SolutionsReader<R> {
    type Item = Result<QuerySolution, QueryResultsParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            InnerSolutionsReader::Xml(reader) => reader.read_next().transpose(),
            InnerSolutionsReader::Json(solutions) => {
                let pairs = solutions.next()?;
                Some(
                    solution_from_pairs(&self.variables, pairs)
                        .map_err(QueryResultsParseError::from),
                )
            }
            InnerSolutionsReader::Tsv(reader) => reader.read_next().transpose(),
        }
    }
}
