//! The query-results façade: drives the top rowsource and exposes the
//! bindings, boolean and triple-stream views of a query execution.

use crate::context::EvalContext;
use crate::error::EvaluationError;
use crate::rowsource::{BoxRowSource, RowSequenceRowSource, RowSource};
use crate::row::Row;
use crate::source::{TriplePartsMask, TripleQuery, TriplesSource};
use crate::translate::build_rowsource;
use crate::variables::VariableTable;
use crate::world::World;
use sparrow_algebra::{GraphPattern, Query, TermPattern, TriplePattern};
use sparrow_model::{NamedOrBlankNode, Term, Triple, Variable};
use sparrow_results::{QueryResultsFormat, QuerySolution, ResultsSerializer};
use std::collections::VecDeque;
use std::io::Write;
use std::rc::Rc;
use tracing::error;

/// What kind of result a query produces.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ResultsKind {
    /// `SELECT`: a stream of bindings rows.
    Bindings,
    /// `ASK`: one boolean.
    Boolean,
    /// `CONSTRUCT`/`DESCRIBE`: a stream of triples.
    Graph,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum State {
    Executing,
    Finished,
    Failed,
}

/// A query execution: owns the rowsource tree and the evaluation context,
/// and hands rows to the consumer or to a results-format writer.
///
/// Errors are sticky: after a failure every operation returns its "no
/// data" sentinel. `finish` tears the execution down and is idempotent.
pub struct QueryResults {
    world: Rc<World>,
    kind: ResultsKind,
    state: State,
    context: Rc<EvalContext>,
    root: Option<BoxRowSource>,
    variables: Vec<Variable>,
    offsets: Vec<usize>,
    current_row: Option<Row>,
    boolean: Option<bool>,
    template: Vec<TriplePattern>,
    describe: bool,
    pending_triples: VecDeque<Triple>,
    current_triple: Option<Triple>,
    execution_count: u64,
    node_count: usize,
}

impl QueryResults {
    /// Prepares and starts the execution of a query over a triples source.
    pub fn new(
        world: &Rc<World>,
        query: &Query,
        source: impl TriplesSource + 'static,
    ) -> Result<Self, EvaluationError> {
        Self::with_source(world, query, Rc::new(source))
    }

    /// As [`QueryResults::new`], with a shared source.
    pub fn with_source(
        world: &Rc<World>,
        query: &Query,
        source: Rc<dyn TriplesSource>,
    ) -> Result<Self, EvaluationError> {
        let variables = VariableTable::new();
        let context = Rc::new(EvalContext::new(
            source,
            variables.clone(),
            query.base_iri().map(ToOwned::to_owned),
        ));
        let mut root = build_rowsource(query.pattern(), &context)?;
        // A top-level ORDER BY is evaluated eagerly into a row sequence
        if matches!(query.pattern(), GraphPattern::OrderBy { .. }) {
            let rows = root.read_all_rows()?;
            let declared = root.variables().to_vec();
            root.finish();
            root = Box::new(RowSequenceRowSource::new(declared, rows));
        }
        let offsets = root.variables().to_vec();
        let bound_variables = offsets
            .iter()
            .filter_map(|offset| variables.variable(*offset))
            .collect();
        let (kind, template, describe) = match query {
            Query::Select { .. } => (ResultsKind::Bindings, Vec::new(), false),
            Query::Ask { .. } => (ResultsKind::Boolean, Vec::new(), false),
            Query::Construct { template, .. } => (ResultsKind::Graph, template.clone(), false),
            Query::Describe { .. } => (ResultsKind::Graph, Vec::new(), true),
        };
        Ok(Self {
            world: Rc::clone(world),
            kind,
            state: State::Executing,
            context,
            root: Some(root),
            variables: bound_variables,
            offsets,
            current_row: None,
            boolean: None,
            template,
            describe,
            pending_triples: VecDeque::new(),
            current_triple: None,
            execution_count: 0,
            node_count: query.pattern().node_count(),
        })
    }

    /// The world this execution was created in.
    pub fn world(&self) -> &Rc<World> {
        &self.world
    }

    pub fn kind(&self) -> ResultsKind {
        self.kind
    }

    pub fn is_bindings(&self) -> bool {
        self.kind == ResultsKind::Bindings
    }

    pub fn is_boolean(&self) -> bool {
        self.kind == ResultsKind::Boolean
    }

    pub fn is_graph(&self) -> bool {
        self.kind == ResultsKind::Graph
    }

    /// The number of algebra nodes this execution was translated from.
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// The number of rows pulled from the top rowsource so far.
    pub fn execution_count(&self) -> u64 {
        self.execution_count
    }

    /// Reseeds the per-execution random state behind `RAND()`, `UUID()` and
    /// fresh blank nodes, making runs deterministic for tests.
    pub fn reseed_random(&mut self, seed: u64) {
        self.context.random.borrow_mut().reseed(seed);
    }

    /// The number of binding columns.
    pub fn get_bindings_count(&self) -> usize {
        self.variables.len()
    }

    pub fn get_binding_name(&self, index: usize) -> Option<&Variable> {
        self.variables.get(index)
    }

    /// The variables of the binding columns, in order.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// The value of the i-th binding in the current row.
    pub fn get_binding_value(&self, index: usize) -> Option<Term> {
        let offset = *self.offsets.get(index)?;
        self.current_row.as_ref()?.get(offset).cloned()
    }

    pub fn get_binding_value_by_name(&self, name: &str) -> Option<Term> {
        let index = self.variables.iter().position(|v| v.as_str() == name)?;
        self.get_binding_value(index)
    }

    /// Advances to the next bindings row; false at the end of the results.
    pub fn next(&mut self) -> Result<bool, EvaluationError> {
        if self.state != State::Executing {
            return Ok(false);
        }
        let Some(root) = &mut self.root else {
            return Ok(false);
        };
        match root.read_row() {
            Ok(Some(row)) => {
                self.current_row = Some(row);
                self.execution_count += 1;
                Ok(true)
            }
            Ok(None) => {
                self.current_row = None;
                self.state = State::Finished;
                Ok(false)
            }
            Err(e) => {
                error!("query execution failed: {e}");
                self.current_row = None;
                self.state = State::Failed;
                Err(e)
            }
        }
    }

    /// The boolean result of an `ASK` execution; computed once and cached.
    pub fn get_boolean(&mut self) -> Result<bool, EvaluationError> {
        if let Some(value) = self.boolean {
            return Ok(value);
        }
        if self.state == State::Failed {
            return Ok(false);
        }
        let value = self.next()?;
        self.boolean = Some(value);
        self.state = State::Finished;
        Ok(value)
    }

    /// The current triple of a `CONSTRUCT`/`DESCRIBE` execution.
    pub fn get_triple(&self) -> Option<&Triple> {
        self.current_triple.as_ref()
    }

    /// Advances to the next triple; false at the end of the stream.
    pub fn next_triple(&mut self) -> Result<bool, EvaluationError> {
        loop {
            if let Some(triple) = self.pending_triples.pop_front() {
                self.current_triple = Some(triple);
                return Ok(true);
            }
            if self.state != State::Executing {
                self.current_triple = None;
                return Ok(false);
            }
            if !self.next()? {
                self.current_triple = None;
                return Ok(false);
            }
            if self.describe {
                self.describe_current_row()?;
            } else {
                self.instantiate_template();
            }
        }
    }

    /// Instantiates the `CONSTRUCT` template for the current row, skipping
    /// ill-formed triples and prefixing template blanks per row.
    fn instantiate_template(&mut self) {
        let Some(row) = &self.current_row else { return };
        let row_prefix = format!("r{}", format_integer(self.execution_count as i64 - 1, 4, '0'));
        for pattern in &self.template {
            let subject = match instantiate_term(&pattern.subject, row, &self.context, &row_prefix)
            {
                Some(Term::NamedNode(node)) => NamedOrBlankNode::NamedNode(node),
                Some(Term::BlankNode(node)) => NamedOrBlankNode::BlankNode(node),
                // A literal or unbound subject skips the triple
                _ => continue,
            };
            let predicate =
                match instantiate_term(&pattern.predicate, row, &self.context, &row_prefix) {
                    Some(Term::NamedNode(node)) => node,
                    // An unbound, literal or blank predicate skips the triple
                    _ => continue,
                };
            let Some(object) = instantiate_term(&pattern.object, row, &self.context, &row_prefix)
            else {
                continue;
            };
            self.pending_triples
                .push_back(Triple::new(subject, predicate, object));
        }
    }

    /// `DESCRIBE`: emits every default-graph triple whose subject is one of
    /// the resources bound in the current row.
    fn describe_current_row(&mut self) -> Result<(), EvaluationError> {
        let Some(row) = self.current_row.clone() else {
            return Ok(());
        };
        let mut described: Vec<Term> = Vec::new();
        for &offset in &self.offsets {
            let Some(value) = row.get(offset) else { continue };
            if value.is_literal() || described.contains(value) {
                continue;
            }
            described.push(value.clone());
            let mut matched = self
                .context
                .source
                .init_triples_match(&TripleQuery {
                    subject: Some(value.clone()),
                    ..TripleQuery::default()
                })
                .map_err(EvaluationError::Source)?;
            while !matched.is_end() {
                let mut bindings: [Option<Term>; 4] = [None, None, None, None];
                matched
                    .bind_match(
                        &mut bindings,
                        TriplePartsMask::PREDICATE.with(TriplePartsMask::OBJECT),
                    )
                    .map_err(EvaluationError::Source)?;
                let subject = match value.clone() {
                    Term::NamedNode(node) => NamedOrBlankNode::NamedNode(node),
                    Term::BlankNode(node) => NamedOrBlankNode::BlankNode(node),
                    Term::Literal(_) => break,
                };
                if let (Some(Term::NamedNode(predicate)), Some(object)) =
                    (bindings[1].take(), bindings[2].take())
                {
                    self.pending_triples
                        .push_back(Triple::new(subject, predicate, object));
                }
                matched.next_match();
            }
            matched.finish();
        }
        Ok(())
    }

    /// Serializes the whole result through a registered results format.
    pub fn write_results<W: Write>(
        &mut self,
        write: W,
        format: QueryResultsFormat,
    ) -> Result<W, EvaluationError> {
        let serializer = ResultsSerializer::new(format);
        match self.kind {
            ResultsKind::Boolean => {
                let value = self.get_boolean()?;
                Ok(serializer.serialize_boolean(write, value)?)
            }
            ResultsKind::Bindings => {
                let variables = self.variables.clone();
                let mut writer = serializer.serialize_solutions(write, variables.clone())?;
                while self.next()? {
                    let values: Vec<Option<Term>> = (0..self.offsets.len())
                        .map(|index| self.get_binding_value(index))
                        .collect();
                    let solution =
                        QuerySolution::from((variables.clone(), values));
                    writer.serialize(&solution)?;
                }
                Ok(writer.finish()?)
            }
            ResultsKind::Graph => Err(EvaluationError::Io(std::io::Error::other(
                "triple streams are not serializable as a bindings results format",
            ))),
        }
    }

    /// Has the execution reached a terminal state?
    pub fn finished(&self) -> bool {
        self.state != State::Executing
    }

    /// Did the execution end without failing?
    pub fn finished_ok(&self) -> bool {
        self.state == State::Finished
    }

    /// Tears down the rowsource tree and releases held resources.
    ///
    /// Idempotent: a second call is a no-op.
    pub fn finish(&mut self) {
        if let Some(mut root) = self.root.take() {
            root.finish();
            self.context.release();
        }
        self.current_row = None;
        self.pending_triples.clear();
        self.current_triple = None;
        if self.state == State::Executing {
            self.state = State::Finished;
        }
    }
}

impl Drop for QueryResults {
    fn drop(&mut self) {
        self.finish();
    }
}

fn instantiate_term(
    pattern: &TermPattern,
    row: &Row,
    context: &EvalContext,
    row_prefix: &str,
) -> Option<Term> {
    match pattern {
        TermPattern::NamedNode(node) => Some(node.clone().into()),
        TermPattern::Literal(literal) => Some(literal.clone().into()),
        TermPattern::BlankNode(node) => {
            // Template blanks are fresh per row
            Some(
                sparrow_model::BlankNode::new_unchecked(format!("{row_prefix}{}", node.as_str()))
                    .into(),
            )
        }
        TermPattern::Variable(variable) => {
            let offset = context.variables.offset(variable.as_str())?;
            row.get(offset).cloned()
        }
    }
}

/// Wraps parsed query solutions into a materialised rowsource addressing
/// its bindings through the given variables table; how results read back
/// from a format become a rowsource again.
pub fn rowsource_from_solutions(
    table: &VariableTable,
    solutions: impl IntoIterator<Item = QuerySolution>,
) -> Box<dyn crate::RowSource> {
    let mut declared = Vec::new();
    let mut rows = Vec::new();
    for solution in solutions {
        let mut row = Row::new();
        for (variable, value) in solution.variables().iter().zip(solution.values()) {
            let offset = table.declare(variable);
            if !declared.contains(&offset) {
                declared.push(offset);
            }
            if let Some(value) = value {
                row.set(offset, value.clone());
            }
        }
        rows.push(row);
    }
    Box::new(RowSequenceRowSource::new(declared, rows))
}

/// Formats an integer into a fixed width with a pad character; the minus
/// sign of a negative value counts towards the width.
pub fn format_integer(value: i64, width: usize, pad: char) -> String {
    let negative = value < 0;
    let digits = value.unsigned_abs().to_string();
    let mut result = String::new();
    if negative {
        result.push('-');
    }
    for _ in digits.len() + usize::from(negative)..width {
        result.push(pad);
    }
    result.push_str(&digits);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_integer_pads_and_counts_the_sign() {
        assert_eq!(format_integer(-42, 5, '0'), "-0042");
        assert_eq!(format_integer(-42, 5, '0').len(), 5);
        assert_eq!(format_integer(42, 5, '0'), "00042");
        assert_eq!(format_integer(123_456, 3, '0'), "123456");
        assert_eq!(format_integer(7, 3, ' '), "  7");
    }
}
