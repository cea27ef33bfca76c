use crate::context::EvalContext;
use crate::error::EvaluationError;
use crate::expression::evaluate_expression;
use crate::row::Row;
use crate::rowsource::{BoxRowSource, RowSource};
use std::rc::Rc;

/// `BIND`/`LET`: adds one named variable to each child row, bound to the
/// value of an expression over that row; an expression error leaves the
/// variable unbound.
pub(crate) struct ExtendRowSource {
    context: Rc<EvalContext>,
    child: BoxRowSource,
    variable_offset: usize,
    expression: sparrow_algebra::Expression,
    declared: Vec<usize>,
    counter: u64,
    failed: bool,
}

impl ExtendRowSource {
    pub fn new(
        context: Rc<EvalContext>,
        child: BoxRowSource,
        variable_offset: usize,
        expression: sparrow_algebra::Expression,
    ) -> Self {
        Self {
            context,
            child,
            variable_offset,
            expression,
            declared: Vec::new(),
            counter: 0,
            failed: false,
        }
    }
}

impl RowSource for ExtendRowSource {
    fn ensure_variables(&mut self) -> Result<(), EvaluationError> {
        self.child.ensure_variables()?;
        if self.declared.is_empty() {
            self.declared = self.child.variables().to_vec();
            if !self.declared.contains(&self.variable_offset) {
                self.declared.push(self.variable_offset);
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
        match self.child.read_row() {
            Ok(Some(mut row)) => {
                if let Ok(Some(value)) =
                    evaluate_expression(&self.expression, &row, &self.context)
                {
                    row.set(self.variable_offset, value);
                }
                row.set_offset(self.counter);
                self.counter += 1;
                Ok(Some(row))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                self.failed = true;
                Err(e)
            }
        }
    }

    fn reset(&mut self) -> Result<(), EvaluationError> {
        self.counter = 0;
        self.failed = false;
        self.child.reset()
    }

    fn inner_rowsource(&self, index: usize) -> Option<&dyn RowSource> {
        (index == 0).then(|| &*self.child)
    }

    fn finish(&mut self) {
        self.child.finish();
    }
}
