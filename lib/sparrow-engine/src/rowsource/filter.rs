use crate::context::EvalContext;
use crate::error::EvaluationError;
use crate::expression::evaluate_expression;
use crate::row::Row;
use crate::rowsource::{BoxRowSource, RowSource};
use crate::value::effective_boolean_value;
use sparrow_algebra::Expression;
use std::rc::Rc;

/// Keeps the child rows for which the expression evaluates to boolean true.
///
/// Rows where the expression is false, unbound or an error are dropped;
/// an expression error is never an iteration error.
pub(crate) struct FilterRowSource {
    context: Rc<EvalContext>,
    child: BoxRowSource,
    expression: Expression,
    counter: u64,
    failed: bool,
}

impl FilterRowSource {
    pub fn new(context: Rc<EvalContext>, child: BoxRowSource, expression: Expression) -> Self {
        Self {
            context,
            child,
            expression,
            counter: 0,
            failed: false,
        }
    }
}

impl RowSource for FilterRowSource {
    fn ensure_variables(&mut self) -> Result<(), EvaluationError> {
        self.child.ensure_variables()
    }

    fn variables(&self) -> &[usize] {
        self.child.variables()
    }

    fn read_row(&mut self) -> Result<Option<Row>, EvaluationError> {
        if self.failed {
            return Ok(None);
        }
        loop {
            let Some(mut row) = self.child.read_row().inspect_err(|_| self.failed = true)?
            else {
                return Ok(None);
            };
            let keep = match evaluate_expression(&self.expression, &row, &self.context) {
                Ok(Some(term)) => effective_boolean_value(&term).unwrap_or(false),
                Ok(None) | Err(_) => false,
            };
            if keep {
                row.set_offset(self.counter);
                self.counter += 1;
                return Ok(Some(row));
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
