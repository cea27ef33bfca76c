//! The basic-graph-pattern rowsource: a backtracking nested scan over an
//! ordered sequence of triple patterns.

use crate::context::EvalContext;
use crate::error::EvaluationError;
use crate::row::Row;
use crate::rowsource::RowSource;
use crate::source::{TriplePartsMask, TripleQuery, TriplesMatch};
use sparrow_algebra::{TermPattern, TriplePattern};
use sparrow_model::Term;
use std::rc::Rc;
use tracing::error;

/// Per-pattern execution state: which variable (by table offset) sits at
/// each position, which positions this column binds first, and the current
/// match iterator.
struct TriplePatternMeta {
    pattern: TriplePattern,
    /// The variable offset at subject, predicate and object, when a variable.
    var_offsets: [Option<usize>; 3],
    /// Is this column the first binder of the variable at that position?
    declares: [bool; 3],
    matcher: Option<ColumnMatcher>,
}

/// A fully ground pattern degenerates to a presence check yielding one
/// empty binding.
enum ColumnMatcher {
    Triples(Box<dyn TriplesMatch>),
    Presence { present: bool, consumed: bool },
}

impl ColumnMatcher {
    fn is_end(&self) -> bool {
        match self {
            Self::Triples(matcher) => matcher.is_end(),
            Self::Presence { present, consumed } => !present || *consumed,
        }
    }

    fn advance(&mut self) {
        match self {
            Self::Triples(matcher) => matcher.next_match(),
            Self::Presence { consumed, .. } => *consumed = true,
        }
    }

    fn finish(&mut self) {
        if let Self::Triples(matcher) = self {
            matcher.finish();
        }
    }
}

/// The BGP scan: bound variables propagate left to right, the rightmost
/// pattern advances first and exhaustion backtracks leftwards.
pub(crate) struct TriplesRowSource {
    context: Rc<EvalContext>,
    metas: Vec<TriplePatternMeta>,
    declared: Vec<usize>,
    row: Row,
    column: usize,
    counter: u64,
    started: bool,
    finished: bool,
    failed: bool,
}

impl TriplesRowSource {
    pub fn new(context: Rc<EvalContext>, patterns: Vec<TriplePattern>) -> Self {
        let mut declared = Vec::new();
        let metas = patterns
            .into_iter()
            .map(|pattern| {
                let mut var_offsets = [None; 3];
                let mut declares = [false; 3];
                for (index, position) in
                    [&pattern.subject, &pattern.predicate, &pattern.object]
                        .into_iter()
                        .enumerate()
                {
                    if let TermPattern::Variable(variable) = position {
                        let offset = context.variables.declare(variable);
                        var_offsets[index] = Some(offset);
                        if !declared.contains(&offset) {
                            declared.push(offset);
                            declares[index] = true;
                        }
                    }
                }
                TriplePatternMeta {
                    pattern,
                    var_offsets,
                    declares,
                    matcher: None,
                }
            })
            .collect();
        Self {
            context,
            metas,
            declared,
            row: Row::new(),
            column: 0,
            counter: 0,
            started: false,
            finished: false,
            failed: false,
        }
    }

    /// The query for one column, substituting variables already bound by
    /// the columns to its left.
    fn build_query(&self, column: usize) -> TripleQuery {
        let meta = &self.metas[column];
        let position = |index: usize, pattern: &TermPattern| -> Option<Term> {
            match meta.var_offsets[index] {
                Some(offset) => self.row.get(offset).cloned(),
                None => pattern.as_term(),
            }
        };
        TripleQuery {
            subject: position(0, &meta.pattern.subject),
            predicate: position(1, &meta.pattern.predicate),
            object: position(2, &meta.pattern.object),
            graph: self.context.active_graph.borrow().clone(),
        }
    }

    fn open_column(&mut self, column: usize) -> Result<(), EvaluationError> {
        let query = self.build_query(column);
        let matcher = if self.metas[column].var_offsets.iter().all(Option::is_none) {
            // No variables left to bind: a presence check
            let (Some(subject), Some(predicate), Some(object)) =
                (&query.subject, &query.predicate, &query.object)
            else {
                unreachable!("ground pattern with missing position")
            };
            let present = self
                .context
                .source
                .triple_present(subject, predicate, object, query.graph.as_ref())
                .map_err(EvaluationError::Source)?;
            ColumnMatcher::Presence {
                present,
                consumed: false,
            }
        } else {
            ColumnMatcher::Triples(
                self.context
                    .source
                    .init_triples_match(&query)
                    .map_err(EvaluationError::Source)?,
            )
        };
        self.metas[column].matcher = Some(matcher);
        Ok(())
    }

    fn unbind_column(&mut self, column: usize) {
        for (index, offset) in self.metas[column].var_offsets.into_iter().enumerate() {
            if self.metas[column].declares[index] {
                if let Some(offset) = offset {
                    self.row.unset(offset);
                }
            }
        }
    }

    /// Binds the current match of `column` into the row; false when the
    /// match disagrees with an already bound repeated variable.
    fn bind_column(&mut self, column: usize) -> Result<bool, EvaluationError> {
        self.unbind_column(column);
        let meta = &self.metas[column];
        let Some(ColumnMatcher::Triples(matcher)) = &meta.matcher else {
            // A presence check binds nothing
            return Ok(true);
        };
        let mut parts = TriplePartsMask::EMPTY;
        for (index, offset) in meta.var_offsets.iter().enumerate() {
            if offset.is_some() {
                parts = parts.with(match index {
                    0 => TriplePartsMask::SUBJECT,
                    1 => TriplePartsMask::PREDICATE,
                    _ => TriplePartsMask::OBJECT,
                });
            }
        }
        let mut bindings: [Option<Term>; 4] = [None, None, None, None];
        matcher
            .bind_match(&mut bindings, parts)
            .map_err(EvaluationError::Source)?;
        let var_offsets = meta.var_offsets;
        for (index, offset) in var_offsets.into_iter().enumerate() {
            let Some(offset) = offset else { continue };
            let Some(value) = bindings[index].take() else {
                continue;
            };
            match self.row.get(offset) {
                Some(existing) => {
                    // A repeated variable must match its earlier binding
                    if *existing != value {
                        self.unbind_column(column);
                        return Ok(false);
                    }
                }
                None => self.row.set(offset, value),
            }
        }
        Ok(true)
    }

    fn fail(&mut self, error: EvaluationError) -> EvaluationError {
        error!("triples rowsource failed: {error}");
        self.failed = true;
        self.finished = true;
        error
    }
}

impl RowSource for TriplesRowSource {
    fn ensure_variables(&mut self) -> Result<(), EvaluationError> {
        Ok(())
    }

    fn variables(&self) -> &[usize] {
        &self.declared
    }

    fn read_row(&mut self) -> Result<Option<Row>, EvaluationError> {
        if self.failed || (self.started && self.finished) {
            return Ok(None);
        }
        if self.metas.is_empty() {
            // The empty BGP yields exactly one empty row
            if self.started {
                return Ok(None);
            }
            self.started = true;
            self.finished = true;
            let mut row = Row::new();
            row.set_offset(self.counter);
            self.counter += 1;
            return Ok(Some(row));
        }
        self.started = true;
        loop {
            if self.metas[self.column].matcher.is_none() {
                if let Err(e) = self.open_column(self.column) {
                    return Err(self.fail(e));
                }
            }
            if self.metas[self.column]
                .matcher
                .as_ref()
                .is_some_and(ColumnMatcher::is_end)
            {
                // This column is exhausted: backtrack
                if let Some(matcher) = &mut self.metas[self.column].matcher {
                    matcher.finish();
                }
                self.metas[self.column].matcher = None;
                self.unbind_column(self.column);
                if self.column == 0 {
                    self.finished = true;
                    return Ok(None);
                }
                self.column -= 1;
                if let Some(matcher) = &mut self.metas[self.column].matcher {
                    matcher.advance();
                }
                continue;
            }
            let bound = match self.bind_column(self.column) {
                Ok(bound) => bound,
                Err(e) => return Err(self.fail(e)),
            };
            if !bound {
                if let Some(matcher) = &mut self.metas[self.column].matcher {
                    matcher.advance();
                }
                continue;
            }
            if self.column + 1 < self.metas.len() {
                self.column += 1;
                continue;
            }
            // All columns matched: emit and advance the rightmost
            let mut row = self.row.clone();
            row.set_offset(self.counter);
            self.counter += 1;
            if let Some(matcher) = &mut self.metas[self.column].matcher {
                matcher.advance();
            }
            return Ok(Some(row));
        }
    }

    fn reset(&mut self) -> Result<(), EvaluationError> {
        for meta in &mut self.metas {
            if let Some(matcher) = &mut meta.matcher {
                matcher.finish();
            }
            meta.matcher = None;
        }
        self.row = Row::new();
        self.column = 0;
        self.counter = 0;
        self.started = false;
        self.finished = false;
        Ok(())
    }

    fn finish(&mut self) {
        for meta in &mut self.metas {
            if let Some(matcher) = &mut meta.matcher {
                matcher.finish();
            }
            meta.matcher = None;
        }
        self.finished = true;
    }
}
