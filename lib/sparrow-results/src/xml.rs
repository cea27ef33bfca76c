//! Implementation of [SPARQL Query Results XML Format](https://www.w3.org/TR/rdf-sparql-XMLres/)

use crate::error::{QueryResultsParseError, QueryResultsSyntaxError};
use crate::solution::QuerySolution;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use sparrow_model::{BlankNode, Literal, NamedNode, Term, Variable};
use std::io::{self, BufReader, Read, Write};
use std::sync::Arc;

pub(crate) fn write_boolean_xml_result<W: Write>(sink: W, value: bool) -> io::Result<W> {
    do_write_boolean_xml_result(sink, value).map_err(map_xml_error)
}

fn do_write_boolean_xml_result<W: Write>(sink: W, value: bool) -> Result<W, quick_xml::Error> {
    let mut writer = Writer::new(sink);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", None, None)))?;
    let mut sparql_open = BytesStart::new("sparql");
    sparql_open.push_attribute(("xmlns", "http://www.w3.org/2005/sparql-results#"));
    writer.write_event(Event::Start(sparql_open))?;
    writer.write_event(Event::Empty(BytesStart::new("head")))?;
    writer.write_event(Event::Start(BytesStart::new("boolean")))?;
    writer.write_event(Event::Text(BytesText::new(if value {
        "true"
    } else {
        "false"
    })))?;
    writer.write_event(Event::End(BytesEnd::new("boolean")))?;
    writer.write_event(Event::End(BytesEnd::new("sparql")))?;
    Ok(writer.into_inner())
}

pub(crate) struct XmlSolutionsWriter<W: Write> {
    writer: Writer<W>,
}

impl<W: Write> XmlSolutionsWriter<W> {
    pub fn start(sink: W, variables: &[Variable]) -> io::Result<Self> {
        Self::do_start(sink, variables).map_err(map_xml_error)
    }

    fn do_start(sink: W, variables: &[Variable]) -> Result<Self, quick_xml::Error> {
        let mut writer = Writer::new(sink);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", None, None)))?;
        let mut sparql_open = BytesStart::new("sparql");
        sparql_open.push_attribute(("xmlns", "http://www.w3.org/2005/sparql-results#"));
        writer.write_event(Event::Start(sparql_open))?;
        writer.write_event(Event::Start(BytesStart::new("head")))?;
        for variable in variables {
            let mut variable_tag = BytesStart::new("variable");
            variable_tag.push_attribute(("name", variable.as_str()));
            writer.write_event(Event::Empty(variable_tag))?;
        }
        writer.write_event(Event::End(BytesEnd::new("head")))?;
        writer.write_event(Event::Start(BytesStart::new("results")))?;
        Ok(Self { writer })
    }

    pub fn write(&mut self, solution: &QuerySolution) -> io::Result<()> {
        self.do_write(solution).map_err(map_xml_error)
    }

    fn do_write(&mut self, solution: &QuerySolution) -> Result<(), quick_xml::Error> {
        self.writer
            .write_event(Event::Start(BytesStart::new("result")))?;
        for (variable, value) in solution.iter() {
            let mut binding_tag = BytesStart::new("binding");
            binding_tag.push_attribute(("name", variable.as_str()));
            self.writer.write_event(Event::Start(binding_tag))?;
            write_xml_term(&mut self.writer, value)?;
            self.writer
                .write_event(Event::End(BytesEnd::new("binding")))?;
        }
        self.writer
            .write_event(Event::End(BytesEnd::new("result")))?;
        Ok(())
    }

    pub fn finish(self) -> io::Result<W> {
        let mut inner = self.do_finish().map_err(map_xml_error)?;
        inner.flush()?;
        Ok(inner)
    }

    fn do_finish(mut self) -> Result<W, quick_xml::Error> {
        self.writer
            .write_event(Event::End(BytesEnd::new("results")))?;
        self.writer
            .write_event(Event::End(BytesEnd::new("sparql")))?;
        Ok(self.writer.into_inner())
    }
}

fn write_xml_term(
    writer: &mut Writer<impl Write>,
    term: &Term,
) -> Result<(), quick_xml::Error> {
    match term {
        Term::NamedNode(uri) => {
            writer.write_event(Event::Start(BytesStart::new("uri")))?;
            writer.write_event(Event::Text(BytesText::new(uri.as_str())))?;
            writer.write_event(Event::End(BytesEnd::new("uri")))?;
        }
        Term::BlankNode(bnode) => {
            writer.write_event(Event::Start(BytesStart::new("bnode")))?;
            writer.write_event(Event::Text(BytesText::new(bnode.as_str())))?;
            writer.write_event(Event::End(BytesEnd::new("bnode")))?;
        }
        Term::Literal(literal) => {
            let mut literal_tag = BytesStart::new("literal");
            if let Some(language) = literal.language() {
                literal_tag.push_attribute(("xml:lang", language));
            } else if !literal.is_plain() {
                literal_tag.push_attribute(("datatype", literal.datatype().as_str()));
            }
            writer.write_event(Event::Start(literal_tag))?;
            writer.write_event(Event::Text(BytesText::new(literal.value())))?;
            writer.write_event(Event::End(BytesEnd::new("literal")))?;
        }
    }
    Ok(())
}

fn map_xml_error(error: quick_xml::Error) -> io::Error {
    match error {
        quick_xml::Error::Io(error) => {
            Arc::try_unwrap(error).unwrap_or_else(|error| io::Error::new(error.kind(), error))
        }
        _ => io::Error::other(error),
    }
}

/// Streaming reader of the XML results format.
pub(crate) enum XmlQueryResultsReader<R: Read> {
    Solutions(XmlSolutionsReader<R>),
    Boolean(bool),
}

impl<R: Read> XmlQueryResultsReader<R> {
    pub fn read(read: R) -> Result<Self, QueryResultsParseError> {
        let mut reader = Reader::from_reader(BufReader::new(read));
        let mut buffer = Vec::new();
        let mut variables = Vec::new();
        loop {
            buffer.clear();
            match reader.read_event_into(&mut buffer)? {
                Event::Start(event) | Event::Empty(event) => {
                    match event.local_name().as_ref() {
                        b"sparql" | b"head" | b"link" => (),
                        b"variable" => {
                            let name = attribute(&event, b"name")?.ok_or_else(|| {
                                QueryResultsSyntaxError::msg(
                                    "The <variable> tag must have a name attribute",
                                )
                            })?;
                            variables.push(Variable::new(&name).map_err(|e| {
                                QueryResultsSyntaxError::msg(format!(
                                    "Invalid variable name {name}: {e}"
                                ))
                            })?);
                        }
                        b"results" => {
                            return Ok(Self::Solutions(XmlSolutionsReader {
                                reader,
                                buffer,
                                variables: variables.into(),
                            }));
                        }
                        b"boolean" => {
                            buffer.clear();
                            return match reader.read_event_into(&mut buffer)? {
                                Event::Text(event) => {
                                    let value = event.unescape().map_err(|e| {
                                        QueryResultsSyntaxError::msg(format!(
                                            "Invalid XML text: {e}"
                                        ))
                                    })?;
                                    match value.trim() {
                                        "true" => Ok(Self::Boolean(true)),
                                        "false" => Ok(Self::Boolean(false)),
                                        value => Err(QueryResultsSyntaxError::msg(format!(
                                            "Unexpected boolean value: {value}"
                                        ))
                                        .into()),
                                    }
                                }
                                _ => Err(QueryResultsSyntaxError::msg(
                                    "The <boolean> tag must contain a boolean value",
                                )
                                .into()),
                            };
                        }
                        tag => {
                            return Err(QueryResultsSyntaxError::msg(format!(
                                "Unexpected tag <{}>",
                                String::from_utf8_lossy(tag)
                            ))
                            .into());
                        }
                    }
                }
                Event::Eof => {
                    return Err(QueryResultsSyntaxError::msg(
                        "Unexpected end of the XML results document",
                    )
                    .into());
                }
                _ => (),
            }
        }
    }
}

pub(crate) struct XmlSolutionsReader<R: Read> {
    reader: Reader<BufReader<R>>,
    buffer: Vec<u8>,
    variables: Arc<[Variable]>,
}

impl<R: Read> XmlSolutionsReader<R> {
    pub fn variables(&self) -> &Arc<[Variable]> {
        &self.variables
    }

    pub fn read_next(&mut self) -> Result<Option<QuerySolution>, QueryResultsParseError> {
        let mut values: Option<Vec<Option<Term>>> = None;
        let mut current_variable: Option<String> = None;
        let mut term_builder: Option<TermBuilder> = None;
        loop {
            self.buffer.clear();
            let event = self.reader.read_event_into(&mut self.buffer)?;
            match event {
                Event::Start(ref start) | Event::Empty(ref start) => {
                    let is_empty = matches!(event, Event::Empty(_));
                    match start.local_name().as_ref() {
                        b"result" => values = Some(vec![None; self.variables.len()]),
                        b"binding" => {
                            current_variable =
                                Some(attribute(start, b"name")?.ok_or_else(|| {
                                    QueryResultsSyntaxError::msg(
                                        "The <binding> tag must have a name attribute",
                                    )
                                })?);
                        }
                        b"uri" => term_builder = Some(TermBuilder::new(TermKind::Uri)),
                        b"bnode" => term_builder = Some(TermBuilder::new(TermKind::BNode)),
                        b"literal" => {
                            let mut builder = TermBuilder::new(TermKind::Literal);
                            builder.language = attribute(start, b"xml:lang")?;
                            builder.datatype = attribute(start, b"datatype")?;
                            term_builder = Some(builder);
                        }
                        tag => {
                            return Err(QueryResultsSyntaxError::msg(format!(
                                "Unexpected tag <{}> in a result",
                                String::from_utf8_lossy(tag)
                            ))
                            .into());
                        }
                    }
                    // An empty element has no matching end event
                    if is_empty {
                        if let Some(builder) = term_builder.take() {
                            store_term(
                                &self.variables,
                                &mut values,
                                &current_variable,
                                builder.build()?,
                            )?;
                        }
                    }
                }
                Event::Text(_) | Event::CData(_) => {
                    if let Some(builder) = &mut term_builder {
                        builder.text.push_str(&text_content(&event)?);
                    }
                }
                Event::End(end) => match end.local_name().as_ref() {
                    b"result" => {
                        let values = values.take().ok_or_else(|| {
                            QueryResultsSyntaxError::msg("Unexpected </result>")
                        })?;
                        return Ok(Some(QuerySolution::from((
                            Arc::clone(&self.variables),
                            values,
                        ))));
                    }
                    b"uri" | b"bnode" | b"literal" => {
                        if let Some(builder) = term_builder.take() {
                            store_term(
                                &self.variables,
                                &mut values,
                                &current_variable,
                                builder.build()?,
                            )?;
                        }
                    }
                    b"binding" => current_variable = None,
                    b"results" | b"sparql" => return Ok(None),
                    _ => (),
                },
                Event::Eof => return Ok(None),
                _ => (),
            }
        }
    }
}

struct TermBuilder {
    kind: TermKind,
    language: Option<String>,
    datatype: Option<String>,
    text: String,
}

enum TermKind {
    Uri,
    BNode,
    Literal,
}

impl TermBuilder {
    fn new(kind: TermKind) -> Self {
        Self {
            kind,
            language: None,
            datatype: None,
            text: String::new(),
        }
    }

    fn build(self) -> Result<Term, QueryResultsParseError> {
        match self.kind {
            TermKind::Uri => Ok(NamedNode::new(&self.text)
                .map_err(|e| QueryResultsSyntaxError::msg(format!("Invalid IRI {}: {e}", self.text)))?
                .into()),
            TermKind::BNode => Ok(BlankNode::new(&self.text)
                .map_err(|e| {
                    QueryResultsSyntaxError::msg(format!("Invalid blank node {}: {e}", self.text))
                })?
                .into()),
            TermKind::Literal => {
                if let Some(language) = self.language {
                    Ok(Literal::new_language_tagged_literal(self.text, &language)
                        .map_err(|e| {
                            QueryResultsSyntaxError::msg(format!(
                                "Invalid language tag {language}: {e}"
                            ))
                        })?
                        .into())
                } else if let Some(datatype) = self.datatype {
                    Ok(Literal::new_typed_literal(
                        self.text,
                        NamedNode::new(&datatype).map_err(|e| {
                            QueryResultsSyntaxError::msg(format!(
                                "Invalid datatype IRI {datatype}: {e}"
                            ))
                        })?,
                    )
                    .into())
                } else {
                    Ok(Literal::new_simple_literal(self.text).into())
                }
            }
        }
    }
}

fn store_term(
    variables: &Arc<[Variable]>,
    values: &mut Option<Vec<Option<Term>>>,
    current_variable: &Option<String>,
    term: Term,
) -> Result<(), QueryResultsParseError> {
    let Some(values) = values else {
        return Err(
            QueryResultsSyntaxError::msg("Term found outside of a <result> tag").into(),
        );
    };
    let Some(name) = current_variable else {
        return Err(
            QueryResultsSyntaxError::msg("Term found outside of a <binding> tag").into(),
        );
    };
    let position = variables
        .iter()
        .position(|v| v.as_str() == name)
        .ok_or_else(|| {
            QueryResultsSyntaxError::msg(format!(
                "The variable {name} is not declared in the <head>"
            ))
        })?;
    values[position] = Some(term);
    Ok(())
}

fn attribute(event: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>, QueryResultsParseError> {
    for attr in event.attributes() {
        let attr =
            attr.map_err(|e| QueryResultsSyntaxError::msg(format!("Invalid attribute: {e}")))?;
        if attr.key.as_ref() == name {
            let value = attr.unescape_value().map_err(|e| {
                QueryResultsSyntaxError::msg(format!("Invalid attribute value: {e}"))
            })?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn text_content(event: &Event<'_>) -> Result<String, QueryResultsParseError> {
    match event {
        Event::Text(event) => Ok(event
            .unescape()
            .map_err(|e| QueryResultsSyntaxError::msg(format!("Invalid XML text: {e}")))?
            .into_owned()),
        Event::CData(event) => String::from_utf8(event.clone().into_inner().into_owned())
            .map_err(|e| QueryResultsSyntaxError::msg(format!("Invalid UTF-8: {e}")).into()),
        _ => Ok(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boolean_result_shape() {
        let buffer = write_boolean_xml_result(Vec::new(), true).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "<?xml version=\"1.0\"?><sparql xmlns=\"http://www.w3.org/2005/sparql-results#\"><head/><boolean>true</boolean></sparql>"
        );
    }

    #[test]
    fn solutions_round_trip() {
        let variables = vec![Variable::new_unchecked("x"), Variable::new_unchecked("y")];
        let solution = QuerySolution::from((
            variables.clone(),
            vec![
                Some(Literal::new_simple_literal("a & b").into()),
                Some(BlankNode::new_unchecked("b0").into()),
            ],
        ));
        let mut writer = XmlSolutionsWriter::start(Vec::new(), &variables).unwrap();
        writer.write(&solution).unwrap();
        let buffer = writer.finish().unwrap();
        match XmlQueryResultsReader::read(buffer.as_slice()).unwrap() {
            XmlQueryResultsReader::Solutions(mut reader) => {
                let row = reader.read_next().unwrap().unwrap();
                assert_eq!(row, solution);
                assert!(reader.read_next().unwrap().is_none());
            }
            XmlQueryResultsReader::Boolean(_) => panic!("expected solutions"),
        }
    }

    #[test]
    fn boolean_reader() {
        let input = br#"<?xml version="1.0"?><sparql xmlns="http://www.w3.org/2005/sparql-results#"><head/><boolean>false</boolean></sparql>"#;
        match XmlQueryResultsReader::read(&input[..]).unwrap() {
            XmlQueryResultsReader::Boolean(value) => assert!(!value),
            XmlQueryResultsReader::Solutions(_) => panic!("expected boolean"),
        }
    }
}
