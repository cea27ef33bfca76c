use crate::context::EvalContext;
use crate::error::EvaluationError;
use crate::row::Row;
use crate::rowsource::{BoxRowSource, RowSource};
use sparrow_model::Term;
use std::rc::Rc;

/// How the `GRAPH` operator names its graph: a constant IRI or a variable
/// enumerated over the known graph names.
pub(crate) enum GraphOrigin {
    Constant(Term),
    Variable(usize),
}

/// `GRAPH`: scopes the inner pattern to a named graph.
///
/// The evaluation context's active graph is set for the dynamic extent of
/// each inner pull and restored afterwards, so sibling operators keep
/// matching against the default graph.
pub(crate) struct GraphRowSource {
    context: Rc<EvalContext>,
    child: BoxRowSource,
    origin: GraphOrigin,
    declared: Vec<usize>,
    graphs: Option<Vec<Term>>,
    graph_cursor: usize,
    exhausted: bool,
    counter: u64,
    failed: bool,
}

impl GraphRowSource {
    pub fn new(context: Rc<EvalContext>, child: BoxRowSource, origin: GraphOrigin) -> Self {
        Self {
            context,
            child,
            origin,
            declared: Vec::new(),
            graphs: None,
            graph_cursor: 0,
            exhausted: false,
            counter: 0,
            failed: false,
        }
    }

    fn current_graph(&self) -> Option<&Term> {
        match &self.origin {
            GraphOrigin::Constant(term) => Some(term),
            GraphOrigin::Variable(_) => self
                .graphs
                .as_ref()
                .and_then(|graphs| graphs.get(self.graph_cursor)),
        }
    }

    /// Pulls one child row with the active graph set, restoring it after.
    fn pull_child(&mut self, graph: Term) -> Result<Option<Row>, EvaluationError> {
        let previous = self.context.active_graph.replace(Some(graph));
        let result = self.child.read_row();
        *self.context.active_graph.borrow_mut() = previous;
        result
    }

    fn read_row_inner(&mut self) -> Result<Option<Row>, EvaluationError> {
        if self.exhausted {
            return Ok(None);
        }
        if matches!(self.origin, GraphOrigin::Variable(_)) && self.graphs.is_none() {
            self.graphs = Some(
                self.context
                    .source
                    .graph_names()
                    .map_err(EvaluationError::Source)?,
            );
        }
        loop {
            let Some(graph) = self.current_graph().cloned() else {
                self.exhausted = true;
                return Ok(None);
            };
            if let Some(mut row) = self.pull_child(graph.clone())? {
                if let GraphOrigin::Variable(offset) = self.origin {
                    row.set(offset, graph);
                }
                row.set_offset(self.counter);
                self.counter += 1;
                return Ok(Some(row));
            }
            match self.origin {
                GraphOrigin::Constant(_) => {
                    self.exhausted = true;
                    return Ok(None);
                }
                GraphOrigin::Variable(_) => {
                    self.graph_cursor += 1;
                    if self
                        .graphs
                        .as_ref()
                        .is_some_and(|graphs| self.graph_cursor < graphs.len())
                    {
                        self.child.reset()?;
                    }
                }
            }
        }
    }
}

impl RowSource for GraphRowSource {
    fn ensure_variables(&mut self) -> Result<(), EvaluationError> {
        self.child.ensure_variables()?;
        if self.declared.is_empty() {
            self.declared = self.child.variables().to_vec();
            if let GraphOrigin::Variable(offset) = self.origin {
                if !self.declared.contains(&offset) {
                    self.declared.push(offset);
                }
            }
        }
        Ok(())
    }

    fn variables(&self) -> &[usize] {
        &self.declared
    }

    fn read_row(&mut self) -> Result<Option<Row>, EvaluationError> {
        if self.failed {
            return Ok(None);
        }
        let result = self.read_row_inner();
        if result.is_err() {
            self.failed = true;
        }
        result
    }

    fn reset(&mut self) -> Result<(), EvaluationError> {
        self.child.reset()?;
        self.graphs = None;
        self.graph_cursor = 0;
        self.exhausted = false;
        self.counter = 0;
        self.failed = false;
        Ok(())
    }

    fn inner_rowsource(&self, index: usize) -> Option<&dyn RowSource> {
        (index == 0).then(|| &*self.child)
    }

    fn finish(&mut self) {
        self.child.finish();
    }
}
