use crate::csv::{
    write_boolean_csv_result, write_boolean_tsv_result, CsvSolutionsWriter, TsvSolutionsWriter,
};
use crate::format::QueryResultsFormat;
use crate::json::{write_boolean_json_result, JsonSolutionsWriter};
use crate::solution::QuerySolution;
use crate::xml::{write_boolean_xml_result, XmlSolutionsWriter};
use sparrow_model::Variable;
use std::io::{self, Write};

/// A serializer for [SPARQL query](https://www.w3.org/TR/sparql11-query/) results.
///
/// It currently supports the following formats:
/// * [SPARQL Query Results XML Format](https://www.w3.org/TR/rdf-sparql-XMLres/) ([`QueryResultsFormat::Xml`])
/// * [SPARQL Query Results JSON Format](https://www.w3.org/TR/sparql11-results-json/) ([`QueryResultsFormat::Json`])
/// * [SPARQL Query Results CSV Format](https://www.w3.org/TR/sparql11-results-csv-tsv/) ([`QueryResultsFormat::Csv`])
/// * [SPARQL Query Results TSV Format](https://www.w3.org/TR/sparql11-results-csv-tsv/) ([`QueryResultsFormat::Tsv`])
///
/// ```
/// use sparrow_model::{Literal, Variable};
/// use sparrow_results::{QueryResultsFormat, QuerySolution, ResultsSerializer};
///
/// let serializer = ResultsSerializer::new(QueryResultsFormat::Tsv);
/// let variables = vec![Variable::new("value")?];
/// let mut writer = serializer.serialize_solutions(Vec::new(), variables.clone())?;
/// writer.serialize(&QuerySolution::from((
///     variables,
///     vec![Some(Literal::from(1i64).into())],
/// )))?;
/// assert_eq!(writer.finish()?, b"?value\n1\n");
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ResultsSerializer {
    format: QueryResultsFormat,
}

impl ResultsSerializer {
    #[inline]
    pub fn new(format: QueryResultsFormat) -> Self {
        Self { format }
    }

    #[inline]
    pub fn format(&self) -> QueryResultsFormat {
        self.format
    }

    /// Writes a boolean query result (`ASK`) to the given sink.
    pub fn serialize_boolean<W: Write>(self, write: W, value: bool) -> io::Result<W> {
        match self.format {
            QueryResultsFormat::Xml => write_boolean_xml_result(write, value),
            QueryResultsFormat::Json => write_boolean_json_result(write, value),
            QueryResultsFormat::Csv => write_boolean_csv_result(write, value),
            QueryResultsFormat::Tsv => write_boolean_tsv_result(write, value),
        }
    }

    /// Starts the streaming serialization of a solutions result (`SELECT`).
    pub fn serialize_solutions<W: Write>(
        self,
        write: W,
        variables: Vec<Variable>,
    ) -> io::Result<SolutionsWriter<W>> {
        Ok(SolutionsWriter {
            inner: match self.format {
                QueryResultsFormat::Xml => {
                    InnerSolutionsWriter::Xml(XmlSolutionsWriter::start(write, &variables)?)
                }
                QueryResultsFormat::Json => {
                    InnerSolutionsWriter::Json(JsonSolutionsWriter::start(write, &variables)?)
                }
                QueryResultsFormat::Csv => {
                    InnerSolutionsWriter::Csv(CsvSolutionsWriter::start(write, variables)?)
                }
                QueryResultsFormat::Tsv => {
                    InnerSolutionsWriter::Tsv(TsvSolutionsWriter::start(write, variables)?)
                }
            },
        })
    }
}

impl From<QueryResultsFormat> for ResultsSerializer {
    #[inline]
    fn from(format: QueryResultsFormat) -> Self {
        Self::new(format)
    }
}

/// A streaming sink of solution rows, driven until exhaustion then finished.
#[must_use]
pub struct SolutionsWriter<W: Write> {
    inner: InnerSolutionsWriter<W>,
}

enum InnerSolutionsWriter<W: Write> {
    Xml(XmlSolutionsWriter<W>),
    Json(JsonSolutionsWriter<W>),
    Csv(CsvSolutionsWriter<W>),
    Tsv(TsvSolutionsWriter<W>),
}

impl<W: Write> SolutionsWriter<W> {
    /// Writes one solution row.
    pub fn serialize(&mut self, solution: &QuerySolution) -> io::Result<()> {
        match &mut self.inner {
            InnerSolutionsWriter::Xml(writer) => writer.write(solution),
            InnerSolutionsWriter::Json(writer) => writer.write(solution),
            InnerSolutionsWriter::Csv(writer) => writer.write(solution),
            InnerSolutionsWriter::Tsv(writer) => writer.write(solution),
        }
    }

    /// Closes the document and returns the underlying sink.
    pub fn finish(self) -> io::Result<W> {
        match self.inner {
            InnerSolutionsWriter::Xml(writer) => writer.finish(),
            InnerSolutionsWriter::Json(writer) => writer.finish(),
            InnerSolutionsWriter::Csv(writer) => Ok(writer.finish()),
            InnerSolutionsWriter::Tsv(writer) => Ok(writer.finish()),
        }
    }
}
