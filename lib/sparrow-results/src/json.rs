//! Implementation of [SPARQL Query Results JSON Format](https://www.w3.org/TR/sparql11-results-json/)

use crate::error::{QueryResultsParseError, QueryResultsSyntaxError};
use crate::solution::QuerySolution;
use json_event_parser::{JsonEvent, ReaderJsonParser, WriterJsonSerializer};
use sparrow_model::vocab::rdf;
use sparrow_model::{BlankNode, Literal, NamedNode, Term, Variable};
use std::io::{self, Read, Write};
use std::sync::Arc;

pub(crate) fn write_boolean_json_result<W: Write>(write: W, value: bool) -> io::Result<W> {
    let mut serializer = WriterJsonSerializer::new(write);
    for event in [
        JsonEvent::StartObject,
        JsonEvent::ObjectKey("head".into()),
        JsonEvent::StartObject,
        JsonEvent::EndObject,
        JsonEvent::ObjectKey("boolean".into()),
        JsonEvent::Boolean(value),
        JsonEvent::EndObject,
    ] {
        serializer.serialize_event(event)?;
    }
    serializer.finish()
}

pub(crate) struct JsonSolutionsWriter<W: Write> {
    serializer: WriterJsonSerializer<W>,
}

impl<W: Write> JsonSolutionsWriter<W> {
    pub fn start(write: W, variables: &[Variable]) -> io::Result<Self> {
        let mut serializer = WriterJsonSerializer::new(write);
        serializer.serialize_event(JsonEvent::StartObject)?;
        serializer.serialize_event(JsonEvent::ObjectKey("head".into()))?;
        serializer.serialize_event(JsonEvent::StartObject)?;
        serializer.serialize_event(JsonEvent::ObjectKey("vars".into()))?;
        serializer.serialize_event(JsonEvent::StartArray)?;
        for variable in variables {
            serializer.serialize_event(JsonEvent::String(variable.as_str().into()))?;
        }
        serializer.serialize_event(JsonEvent::EndArray)?;
        serializer.serialize_event(JsonEvent::EndObject)?;
        serializer.serialize_event(JsonEvent::ObjectKey("results".into()))?;
        serializer.serialize_event(JsonEvent::StartObject)?;
        serializer.serialize_event(JsonEvent::ObjectKey("bindings".into()))?;
        serializer.serialize_event(JsonEvent::StartArray)?;
        Ok(Self { serializer })
    }

    pub fn write(&mut self, solution: &QuerySolution) -> io::Result<()> {
        self.serializer.serialize_event(JsonEvent::StartObject)?;
        for (variable, value) in solution.iter() {
            self.serializer
                .serialize_event(JsonEvent::ObjectKey(variable.as_str().into()))?;
            self.write_term(value)?;
        }
        self.serializer.serialize_event(JsonEvent::EndObject)?;
        Ok(())
    }

    fn write_term(&mut self, term: &Term) -> io::Result<()> {
        self.serializer.serialize_event(JsonEvent::StartObject)?;
        match term {
            Term::NamedNode(uri) => {
                self.serializer
                    .serialize_event(JsonEvent::ObjectKey("type".into()))?;
                self.serializer
                    .serialize_event(JsonEvent::String("uri".into()))?;
                self.serializer
                    .serialize_event(JsonEvent::ObjectKey("value".into()))?;
                self.serializer
                    .serialize_event(JsonEvent::String(uri.as_str().into()))?;
            }
            Term::BlankNode(bnode) => {
                self.serializer
                    .serialize_event(JsonEvent::ObjectKey("type".into()))?;
                self.serializer
                    .serialize_event(JsonEvent::String("bnode".into()))?;
                self.serializer
                    .serialize_event(JsonEvent::ObjectKey("value".into()))?;
                self.serializer
                    .serialize_event(JsonEvent::String(bnode.as_str().into()))?;
            }
            Term::Literal(literal) => {
                self.serializer
                    .serialize_event(JsonEvent::ObjectKey("type".into()))?;
                self.serializer
                    .serialize_event(JsonEvent::String("literal".into()))?;
                self.serializer
                    .serialize_event(JsonEvent::ObjectKey("value".into()))?;
                self.serializer
                    .serialize_event(JsonEvent::String(literal.value().into()))?;
                if let Some(language) = literal.language() {
                    self.serializer
                        .serialize_event(JsonEvent::ObjectKey("xml:lang".into()))?;
                    self.serializer
                        .serialize_event(JsonEvent::String(language.into()))?;
                } else if !literal.is_plain() {
                    self.serializer
                        .serialize_event(JsonEvent::ObjectKey("datatype".into()))?;
                    self.serializer
                        .serialize_event(JsonEvent::String(literal.datatype().as_str().into()))?;
                }
            }
        }
        self.serializer.serialize_event(JsonEvent::EndObject)?;
        Ok(())
    }

    pub fn finish(mut self) -> io::Result<W> {
        self.serializer.serialize_event(JsonEvent::EndArray)?;
        self.serializer.serialize_event(JsonEvent::EndObject)?;
        self.serializer.serialize_event(JsonEvent::EndObject)?;
        self.serializer.finish()
    }
}

/// Buffered reader of the JSON results format.
///
/// The whole document is parsed eagerly: the `head` key is allowed to come
/// after `results`, so streaming would have to buffer rows anyway.
pub(crate) enum JsonQueryResultsReader {
    Solutions {
        variables: Arc<[Variable]>,
        solutions: std::vec::IntoIter<Vec<(String, Term)>>,
    },
    Boolean(bool),
}

impl JsonQueryResultsReader {
    pub fn read(read: impl Read) -> Result<Self, QueryResultsParseError> {
        let mut parser = ReaderJsonParser::new(read);
        expect_event(&mut parser, JsonEvent::StartObject, "SPARQL JSON results must be an object")?;
        let mut variables: Option<Vec<Variable>> = None;
        let mut boolean = None;
        let mut solutions: Option<Vec<Vec<(String, Term)>>> = None;
        while let Some(key) = next_object_key(&mut parser)? {
            match key.as_str() {
                "head" => variables = Some(read_head(&mut parser)?),
                "boolean" => {
                    boolean = Some(match parser.parse_next()? {
                        JsonEvent::Boolean(value) => value,
                        _ => {
                            return Err(QueryResultsSyntaxError::msg(
                                "The 'boolean' key must carry a boolean",
                            )
                            .into());
                        }
                    });
                }
                "results" => solutions = Some(read_results(&mut parser)?),
                _ => skip_value(&mut parser)?,
            }
        }
        if let Some(boolean) = boolean {
            return Ok(Self::Boolean(boolean));
        }
        let Some(solutions) = solutions else {
            return Err(QueryResultsSyntaxError::msg(
                "SPARQL JSON results must contain a 'boolean' or a 'results' key",
            )
            .into());
        };
        let variables = variables.ok_or_else(|| {
            QueryResultsSyntaxError::msg("SPARQL JSON results must contain a 'head' key")
        })?;
        Ok(Self::Solutions {
            variables: variables.into(),
            solutions: solutions.into_iter(),
        })
    }
}

fn read_head(
    parser: &mut ReaderJsonParser<impl Read>,
) -> Result<Vec<Variable>, QueryResultsParseError> {
    expect_event(parser, JsonEvent::StartObject, "'head' must be an object")?;
    let mut variables = Vec::new();
    while let Some(key) = next_object_key(parser)? {
        if key == "vars" {
            expect_event(parser, JsonEvent::StartArray, "'vars' must be an array")?;
            while let Some(name) = next_array_string(parser)? {
                variables.push(Variable::new(&name).map_err(|e| {
                    QueryResultsSyntaxError::msg(format!("Invalid variable name {name}: {e}"))
                })?);
            }
        } else {
            skip_value(parser)?;
        }
    }
    Ok(variables)
}

fn read_results(
    parser: &mut ReaderJsonParser<impl Read>,
) -> Result<Vec<Vec<(String, Term)>>, QueryResultsParseError> {
    expect_event(parser, JsonEvent::StartObject, "'results' must be an object")?;
    let mut solutions = Vec::new();
    while let Some(key) = next_object_key(parser)? {
        if key == "bindings" {
            expect_event(parser, JsonEvent::StartArray, "'bindings' must be an array")?;
            while next_array_object(parser)? {
                let mut solution = Vec::new();
                while let Some(variable) = next_object_key(parser)? {
                    let term = read_term(parser)?;
                    solution.push((variable, term));
                }
                solutions.push(solution);
            }
        } else {
            skip_value(parser)?;
        }
    }
    Ok(solutions)
}

fn read_term(parser: &mut ReaderJsonParser<impl Read>) -> Result<Term, QueryResultsParseError> {
    expect_event(parser, JsonEvent::StartObject, "RDF terms must be objects")?;
    let mut term_type: Option<String> = None;
    let mut value: Option<String> = None;
    let mut language: Option<String> = None;
    let mut datatype: Option<String> = None;
    while let Some(key) = next_object_key(parser)? {
        let field = next_string_value(parser, &key)?;
        match key.as_str() {
            "type" => term_type = Some(field),
            "value" => value = Some(field),
            "xml:lang" => language = Some(field),
            "datatype" => datatype = Some(field),
            _ => (),
        }
    }
    let value = value
        .ok_or_else(|| QueryResultsSyntaxError::msg("RDF terms must have a 'value' field"))?;
    match term_type.as_deref() {
        Some("uri") => Ok(NamedNode::new(value)
            .map_err(|e| QueryResultsSyntaxError::msg(format!("Invalid IRI: {e}")))?
            .into()),
        Some("bnode") => Ok(BlankNode::new(value)
            .map_err(|e| QueryResultsSyntaxError::msg(format!("Invalid blank node: {e}")))?
            .into()),
        // "typed-literal" is the legacy spelling of the pre-recommendation drafts
        Some("literal" | "typed-literal") => {
            if let Some(language) = language {
                if let Some(datatype) = datatype {
                    if datatype != rdf::LANG_STRING.as_str() {
                        return Err(QueryResultsSyntaxError::msg(format!(
                            "Literals with a language tag must have the rdf:langString datatype, found {datatype}"
                        ))
                        .into());
                    }
                }
                Ok(Literal::new_language_tagged_literal(value, &language)
                    .map_err(|e| {
                        QueryResultsSyntaxError::msg(format!(
                            "Invalid language tag {language}: {e}"
                        ))
                    })?
                    .into())
            } else if let Some(datatype) = datatype {
                Ok(Literal::new_typed_literal(
                    value,
                    NamedNode::new(datatype).map_err(|e| {
                        QueryResultsSyntaxError::msg(format!("Invalid datatype IRI: {e}"))
                    })?,
                )
                .into())
            } else {
                Ok(Literal::new_simple_literal(value).into())
            }
        }
        Some(other) => Err(QueryResultsSyntaxError::msg(format!(
            "Unexpected term type: '{other}'"
        ))
        .into()),
        None => Err(QueryResultsSyntaxError::msg("RDF terms must have a 'type' field").into()),
    }
}

/// The next object key as an owned string, or `None` at the end of the object.
fn next_object_key(
    parser: &mut ReaderJsonParser<impl Read>,
) -> Result<Option<String>, QueryResultsParseError> {
    match parser.parse_next()? {
        JsonEvent::ObjectKey(key) => Ok(Some(key.to_string())),
        JsonEvent::EndObject => Ok(None),
        _ => Err(QueryResultsSyntaxError::msg("Expecting an object key").into()),
    }
}

/// The next string of an array, or `None` at the end of the array.
fn next_array_string(
    parser: &mut ReaderJsonParser<impl Read>,
) -> Result<Option<String>, QueryResultsParseError> {
    match parser.parse_next()? {
        JsonEvent::String(value) => Ok(Some(value.to_string())),
        JsonEvent::EndArray => Ok(None),
        _ => Err(QueryResultsSyntaxError::msg("Expecting an array of strings").into()),
    }
}

/// Enters the next object of an array, returning `false` at the end of the array.
fn next_array_object(
    parser: &mut ReaderJsonParser<impl Read>,
) -> Result<bool, QueryResultsParseError> {
    match parser.parse_next()? {
        JsonEvent::StartObject => Ok(true),
        JsonEvent::EndArray => Ok(false),
        _ => Err(QueryResultsSyntaxError::msg("Expecting an array of objects").into()),
    }
}

fn next_string_value(
    parser: &mut ReaderJsonParser<impl Read>,
    key: &str,
) -> Result<String, QueryResultsParseError> {
    match parser.parse_next()? {
        JsonEvent::String(value) => Ok(value.to_string()),
        _ => Err(QueryResultsSyntaxError::msg(format!(
            "The term field '{key}' must be a string"
        ))
        .into()),
    }
}

fn skip_value(parser: &mut ReaderJsonParser<impl Read>) -> Result<(), QueryResultsParseError> {
    let mut depth = 0_usize;
    loop {
        match parser.parse_next()? {
            JsonEvent::StartObject | JsonEvent::StartArray => depth += 1,
            JsonEvent::EndObject | JsonEvent::EndArray => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    QueryResultsSyntaxError::msg("Unexpected object or array end")
                })?;
                if depth == 0 {
                    return Ok(());
                }
            }
            JsonEvent::Eof => {
                return Err(QueryResultsSyntaxError::msg("Unexpected end of file").into());
            }
            _ => {
                if depth == 0 {
                    return Ok(());
                }
            }
        }
    }
}

fn expect_event(
    parser: &mut ReaderJsonParser<impl Read>,
    expected: JsonEvent<'_>,
    message: &str,
) -> Result<(), QueryResultsParseError> {
    if parser.parse_next()? == expected {
        Ok(())
    } else {
        Err(QueryResultsSyntaxError::msg(message).into())
    }
}

/// Reconstructs positional rows from the per-variable term lists of a parsed document.
pub(crate) fn solution_from_pairs(
    variables: &Arc<[Variable]>,
    pairs: Vec<(String, Term)>,
) -> Result<QuerySolution, QueryResultsSyntaxError> {
    let mut values = vec![None; variables.len()];
    for (name, term) in pairs {
        let position = variables
            .iter()
            .position(|v| v.as_str() == name)
            .ok_or_else(|| {
                QueryResultsSyntaxError::msg(format!(
                    "The variable {name} is not defined in the result head"
                ))
            })?;
        values[position] = Some(term);
    }
    Ok(QuerySolution::from((Arc::clone(variables), values)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boolean_result_shape() {
        let buffer = write_boolean_json_result(Vec::new(), true).unwrap();
        assert_eq!(buffer, br#"{"head":{},"boolean":true}"#);
    }

    #[test]
    fn solutions_round_trip() {
        let variables = vec![Variable::new_unchecked("x"), Variable::new_unchecked("y")];
        let solution = QuerySolution::from((
            variables.clone(),
            vec![
                Some(NamedNode::new_unchecked("http://example.com/a").into()),
                Some(
                    Literal::new_language_tagged_literal("chat", "fr")
                        .unwrap()
                        .into(),
                ),
            ],
        ));
        let mut writer = JsonSolutionsWriter::start(Vec::new(), &variables).unwrap();
        writer.write(&solution).unwrap();
        let buffer = writer.finish().unwrap();
        match JsonQueryResultsReader::read(buffer.as_slice()).unwrap() {
            JsonQueryResultsReader::Solutions {
                variables,
                mut solutions,
            } => {
                let row = solution_from_pairs(&variables, solutions.next().unwrap()).unwrap();
                assert_eq!(row, solution);
                assert!(solutions.next().is_none());
            }
            JsonQueryResultsReader::Boolean(_) => panic!("expected solutions"),
        }
    }

    #[test]
    fn boolean_reader() {
        match JsonQueryResultsReader::read(&br#"{"head":{},"boolean":false}"#[..]).unwrap() {
            JsonQueryResultsReader::Boolean(value) => assert!(!value),
            JsonQueryResultsReader::Solutions { .. } => panic!("expected boolean"),
        }
    }
}
