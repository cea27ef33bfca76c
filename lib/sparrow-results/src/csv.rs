//! Implementation of [SPARQL 1.1 Query Results CSV and TSV Formats](https://www.w3.org/TR/sparql11-results-csv-tsv/)

use crate::error::{QueryResultsParseError, QueryResultsSyntaxError};
use crate::solution::QuerySolution;
use memchr::memchr;
use sparrow_model::vocab::xsd;
use sparrow_model::{BlankNode, Literal, NamedNode, Term, Variable};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::sync::Arc;

pub(crate) fn write_boolean_csv_result<W: Write>(mut write: W, value: bool) -> io::Result<W> {
    write.write_all(if value { b"true" } else { b"false" })?;
    Ok(write)
}

pub(crate) struct CsvSolutionsWriter<W: Write> {
    write: W,
    variables: Vec<Variable>,
    buffer: String,
}

impl<W: Write> CsvSolutionsWriter<W> {
    pub fn start(mut write: W, variables: Vec<Variable>) -> io::Result<Self> {
        let mut buffer = String::new();
        for (i, variable) in variables.iter().enumerate() {
            if i > 0 {
                buffer.push(',');
            }
            buffer.push_str(variable.as_str());
        }
        buffer.push_str("\r\n");
        write.write_all(buffer.as_bytes())?;
        buffer.clear();
        Ok(Self {
            write,
            variables,
            buffer,
        })
    }

    pub fn write(&mut self, solution: &QuerySolution) -> io::Result<()> {
        for (i, variable) in self.variables.iter().enumerate() {
            if i > 0 {
                self.buffer.push(',');
            }
            if let Some(value) = solution.get(variable) {
                write_csv_term(&mut self.buffer, value);
            }
        }
        self.buffer.push_str("\r\n");
        self.write.write_all(self.buffer.as_bytes())?;
        self.buffer.clear();
        Ok(())
    }

    pub fn finish(self) -> W {
        self.write
    }
}

fn write_csv_term(output: &mut String, term: &Term) {
    match term {
        Term::NamedNode(uri) => output.push_str(uri.as_str()),
        Term::BlankNode(bnode) => {
            output.push_str("_:");
            output.push_str(bnode.as_str());
        }
        Term::Literal(literal) => write_escaped_csv_string(output, literal.value()),
    }
}

fn write_escaped_csv_string(output: &mut String, s: &str) {
    if s.bytes().any(|c| matches!(c, b'"' | b',' | b'\n' | b'\r')) {
        output.push('"');
        for c in s.chars() {
            if c == '"' {
                output.push('"');
                output.push('"');
            } else {
                output.push(c);
            }
        }
        output.push('"');
    } else {
        output.push_str(s);
    }
}

pub(crate) fn write_boolean_tsv_result<W: Write>(mut write: W, value: bool) -> io::Result<W> {
    write.write_all(if value { b"true" } else { b"false" })?;
    Ok(write)
}

pub(crate) struct TsvSolutionsWriter<W: Write> {
    write: W,
    variables: Vec<Variable>,
    buffer: String,
}

impl<W: Write> TsvSolutionsWriter<W> {
    pub fn start(mut write: W, variables: Vec<Variable>) -> io::Result<Self> {
        let mut buffer = String::new();
        for (i, variable) in variables.iter().enumerate() {
            if i > 0 {
                buffer.push('\t');
            }
            buffer.push('?');
            buffer.push_str(variable.as_str());
        }
        buffer.push('\n');
        write.write_all(buffer.as_bytes())?;
        buffer.clear();
        Ok(Self {
            write,
            variables,
            buffer,
        })
    }

    pub fn write(&mut self, solution: &QuerySolution) -> io::Result<()> {
        for (i, variable) in self.variables.iter().enumerate() {
            if i > 0 {
                self.buffer.push('\t');
            }
            if let Some(value) = solution.get(variable) {
                write_tsv_term(&mut self.buffer, value);
            }
        }
        self.buffer.push('\n');
        self.write.write_all(self.buffer.as_bytes())?;
        self.buffer.clear();
        Ok(())
    }

    pub fn finish(self) -> W {
        self.write
    }
}

fn write_tsv_term(output: &mut String, term: &Term) {
    match term {
        Term::NamedNode(node) => {
            output.push('<');
            output.push_str(node.as_str());
            output.push('>');
        }
        Term::BlankNode(node) => {
            output.push_str("_:");
            output.push_str(node.as_str());
        }
        Term::Literal(literal) => {
            let value = literal.value();
            if let Some(language) = literal.language() {
                write_tsv_quoted_str(output, value);
                output.push('@');
                output.push_str(language);
            } else {
                match literal.datatype() {
                    dt if dt == xsd::BOOLEAN && is_turtle_boolean(value) => output.push_str(value),
                    dt if dt == xsd::INTEGER && is_turtle_integer(value) => output.push_str(value),
                    dt if dt == xsd::DECIMAL && is_turtle_decimal(value) => output.push_str(value),
                    dt if dt == xsd::DOUBLE && is_turtle_double(value) => output.push_str(value),
                    dt if dt == xsd::STRING => write_tsv_quoted_str(output, value),
                    dt => {
                        write_tsv_quoted_str(output, value);
                        output.push_str("^^<");
                        output.push_str(dt.as_str());
                        output.push('>');
                    }
                }
            }
        }
    }
}

fn write_tsv_quoted_str(output: &mut String, string: &str) {
    output.push('"');
    for c in string.chars() {
        match c {
            '\t' => output.push_str("\\t"),
            '\n' => output.push_str("\\n"),
            '\r' => output.push_str("\\r"),
            '"' => output.push_str("\\\""),
            '\\' => output.push_str("\\\\"),
            _ => output.push(c),
        }
    }
    output.push('"');
}

fn is_turtle_boolean(value: &str) -> bool {
    matches!(value, "true" | "false")
}

fn is_turtle_integer(value: &str) -> bool {
    // [19] INTEGER ::= [+-]? [0-9]+
    let mut value = value.as_bytes();
    if let Some(v) = value.strip_prefix(b"+").or_else(|| value.strip_prefix(b"-")) {
        value = v;
    }
    !value.is_empty() && value.iter().all(u8::is_ascii_digit)
}

fn is_turtle_decimal(value: &str) -> bool {
    // [20] DECIMAL ::= [+-]? [0-9]* '.' [0-9]+
    let mut value = value.as_bytes();
    if let Some(v) = value.strip_prefix(b"+").or_else(|| value.strip_prefix(b"-")) {
        value = v;
    }
    let Some(first_dot) = memchr(b'.', value) else {
        return false;
    };
    let (with_dot, after_dot) = value.split_at(first_dot + 1);
    with_dot[..first_dot].iter().all(u8::is_ascii_digit)
        && !after_dot.is_empty()
        && after_dot.iter().all(u8::is_ascii_digit)
}

fn is_turtle_double(value: &str) -> bool {
    // [21] DOUBLE ::= [+-]? ([0-9]+ '.' [0-9]* | '.'? [0-9]+) EXPONENT
    let mut value = value.as_bytes();
    if let Some(v) = value.strip_prefix(b"+").or_else(|| value.strip_prefix(b"-")) {
        value = v;
    }
    let Some(exponent) = memchr(b'e', value).or_else(|| memchr(b'E', value)) else {
        return false;
    };
    let (mantissa, mut exponent) = value.split_at(exponent);
    exponent = &exponent[1..];
    if let Some(e) = exponent
        .strip_prefix(b"+")
        .or_else(|| exponent.strip_prefix(b"-"))
    {
        exponent = e;
    }
    if exponent.is_empty() || !exponent.iter().all(u8::is_ascii_digit) {
        return false;
    }
    let mut digits_seen = false;
    let mut dot_seen = false;
    for b in mantissa {
        if b.is_ascii_digit() {
            digits_seen = true;
        } else if *b == b'.' && !dot_seen {
            dot_seen = true;
        } else {
            return false;
        }
    }
    digits_seen
}

/// Streaming reader of the TSV results format.
pub(crate) enum TsvQueryResultsReader<R: Read> {
    Solutions(TsvSolutionsReader<R>),
    Boolean(bool),
}

impl<R: Read> TsvQueryResultsReader<R> {
    pub fn read(read: R) -> Result<Self, QueryResultsParseError> {
        let mut lines = BufReader::new(read);
        let mut line = String::new();
        lines.read_line(&mut line)?;
        let header = line.trim_end_matches(['\r', '\n']);
        if matches!(header, "true" | "false") {
            return Ok(Self::Boolean(header == "true"));
        }
        let mut variables = Vec::new();
        if !header.is_empty() {
            for v in header.split('\t') {
                let v = v.trim();
                let name = v.strip_prefix('?').ok_or_else(|| {
                    QueryResultsSyntaxError::located_msg(
                        format!("The TSV header variable {v} is not prefixed with ?"),
                        0,
                    )
                })?;
                variables.push(Variable::new(name).map_err(|e| {
                    QueryResultsSyntaxError::located_msg(
                        format!("Invalid variable name {v}: {e}"),
                        0,
                    )
                })?);
            }
        }
        Ok(Self::Solutions(TsvSolutionsReader {
            lines,
            variables: variables.into(),
            line_number: 0,
            buffer: String::new(),
        }))
    }
}

pub(crate) struct TsvSolutionsReader<R: Read> {
    lines: BufReader<R>,
    variables: Arc<[Variable]>,
    line_number: u64,
    buffer: String,
}

impl<R: Read> TsvSolutionsReader<R> {
    pub fn variables(&self) -> &Arc<[Variable]> {
        &self.variables
    }

    pub fn read_next(&mut self) -> Result<Option<QuerySolution>, QueryResultsParseError> {
        self.buffer.clear();
        if self.lines.read_line(&mut self.buffer)? == 0 {
            return Ok(None);
        }
        self.line_number += 1;
        let line = self.buffer.trim_end_matches(['\r', '\n']);
        if line.is_empty() && self.variables.is_empty() {
            // The solution of a zero-column row set
            return Ok(Some(QuerySolution::from((
                Arc::clone(&self.variables),
                Vec::new(),
            ))));
        }
        let mut values = Vec::with_capacity(self.variables.len());
        for chunk in line.split('\t') {
            let chunk = chunk.trim();
            if chunk.is_empty() {
                values.push(None);
            } else {
                values.push(Some(parse_tsv_term(chunk).map_err(|msg| {
                    QueryResultsSyntaxError::located_msg(msg, self.line_number)
                })?));
            }
        }
        if values.len() != self.variables.len() {
            return Err(QueryResultsSyntaxError::located_msg(
                format!(
                    "This TSV files has {} columns but we found a row with {} columns",
                    self.variables.len(),
                    values.len()
                ),
                self.line_number,
            )
            .into());
        }
        Ok(Some(QuerySolution::from((
            Arc::clone(&self.variables),
            values,
        ))))
    }
}

/// Parses a term in the N-Triples-flavoured syntax TSV uses, including the
/// Turtle shorthand for booleans and numbers.
fn parse_tsv_term(value: &str) -> Result<Term, String> {
    if let Some(iri) = value.strip_prefix('<') {
        let iri = iri
            .strip_suffix('>')
            .ok_or_else(|| format!("Unterminated IRI: {value}"))?;
        return Ok(NamedNode::new(iri)
            .map_err(|e| format!("Invalid IRI {iri}: {e}"))?
            .into());
    }
    if let Some(id) = value.strip_prefix("_:") {
        return Ok(BlankNode::new(id)
            .map_err(|e| format!("Invalid blank node {value}: {e}"))?
            .into());
    }
    if value.starts_with('"') || value.starts_with('\'') {
        return parse_quoted_literal(value);
    }
    if is_turtle_boolean(value) {
        return Ok(Literal::new_typed_literal(value, xsd::BOOLEAN).into());
    }
    if is_turtle_integer(value) {
        return Ok(Literal::new_typed_literal(value, xsd::INTEGER).into());
    }
    if is_turtle_decimal(value) {
        return Ok(Literal::new_typed_literal(value, xsd::DECIMAL).into());
    }
    if is_turtle_double(value) {
        return Ok(Literal::new_typed_literal(value, xsd::DOUBLE).into());
    }
    Err(format!("Unexpected term serialization: {value}"))
}

fn parse_quoted_literal(value: &str) -> Result<Term, String> {
    let quote = value.chars().next().unwrap_or('"');
    let mut chars = value[1..].char_indices();
    let mut lexical = String::new();
    let mut end = None;
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, 't')) => lexical.push('\t'),
                Some((_, 'b')) => lexical.push('\u{08}'),
                Some((_, 'n')) => lexical.push('\n'),
                Some((_, 'r')) => lexical.push('\r'),
                Some((_, 'f')) => lexical.push('\u{0C}'),
                Some((_, '"')) => lexical.push('"'),
                Some((_, '\'')) => lexical.push('\''),
                Some((_, '\\')) => lexical.push('\\'),
                Some((_, 'u' | 'U')) => {
                    return Err(format!(
                        "\\u escapes are not supported in this reader: {value}"
                    ));
                }
                _ => return Err(format!("Invalid escape sequence in {value}")),
            },
            c if c == quote => {
                end = Some(i + 1 + c.len_utf8());
                break;
            }
            c => lexical.push(c),
        }
    }
    let end = end.ok_or_else(|| format!("Unterminated literal: {value}"))?;
    let rest = &value[end..];
    if let Some(language) = rest.strip_prefix('@') {
        return Ok(Literal::new_language_tagged_literal(lexical, language)
            .map_err(|e| format!("Invalid language tag {language}: {e}"))?
            .into());
    }
    if let Some(datatype) = rest.strip_prefix("^^") {
        let datatype = datatype
            .strip_prefix('<')
            .and_then(|d| d.strip_suffix('>'))
            .ok_or_else(|| format!("Invalid datatype IRI serialization: {rest}"))?;
        let datatype = NamedNode::new(datatype).map_err(|e| format!("Invalid datatype: {e}"))?;
        return Ok(Literal::new_typed_literal(lexical, datatype).into());
    }
    if rest.is_empty() {
        return Ok(Literal::new_simple_literal(lexical).into());
    }
    Err(format!("Unexpected trailing content after literal: {rest}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solution(values: Vec<Option<Term>>) -> QuerySolution {
        QuerySolution::from((
            vec![Variable::new_unchecked("x"), Variable::new_unchecked("y")],
            values,
        ))
    }

    #[test]
    fn csv_escapes_and_crlf() {
        let mut writer = CsvSolutionsWriter::start(
            Vec::new(),
            vec![Variable::new_unchecked("x"), Variable::new_unchecked("y")],
        )
        .unwrap();
        writer
            .write(&solution(vec![
                Some(Literal::new_simple_literal("a,b").into()),
                Some(NamedNode::new_unchecked("http://example.com").into()),
            ]))
            .unwrap();
        let out = String::from_utf8(writer.finish()).unwrap();
        assert_eq!(out, "x,y\r\n\"a,b\",http://example.com\r\n");
    }

    #[test]
    fn tsv_round_trips_typed_terms() {
        let values = vec![
            Some(Literal::new_typed_literal("12", xsd::INTEGER).into()),
            Some(
                Literal::new_language_tagged_literal("caf\u{e9}", "fr")
                    .unwrap()
                    .into(),
            ),
        ];
        let mut writer = TsvSolutionsWriter::start(
            Vec::new(),
            vec![Variable::new_unchecked("x"), Variable::new_unchecked("y")],
        )
        .unwrap();
        writer.write(&solution(values.clone())).unwrap();
        let out = writer.finish();
        assert_eq!(
            String::from_utf8(out.clone()).unwrap(),
            "?x\t?y\n12\t\"caf\u{e9}\"@fr\n"
        );
        match TsvQueryResultsReader::read(out.as_slice()).unwrap() {
            TsvQueryResultsReader::Solutions(mut reader) => {
                let row = reader.read_next().unwrap().unwrap();
                assert_eq!(row.values(), &values[..]);
                assert!(reader.read_next().unwrap().is_none());
            }
            TsvQueryResultsReader::Boolean(_) => panic!("expected solutions"),
        }
    }

    #[test]
    fn tsv_boolean_is_detected() {
        match TsvQueryResultsReader::read(&b"true\n"[..]).unwrap() {
            TsvQueryResultsReader::Boolean(value) => assert!(value),
            TsvQueryResultsReader::Solutions(_) => panic!("expected boolean"),
        }
    }
}
