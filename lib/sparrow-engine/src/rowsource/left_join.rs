use crate::context::EvalContext;
use crate::error::EvaluationError;
use crate::expression::evaluate_expression;
use crate::row::Row;
use crate::rowsource::{union_of_variables, BoxRowSource, RowSource};
use crate::value::effective_boolean_value;
use sparrow_algebra::Expression;
use std::rc::Rc;

/// `OPTIONAL`: a left join with an optional filter over the merged bindings.
///
/// A merged row is emitted when the rows are compatible and the filter
/// holds (errors count as false); a left row with no surviving right match
/// is emitted unchanged.
pub(crate) struct LeftJoinRowSource {
    context: Rc<EvalContext>,
    left: BoxRowSource,
    right: BoxRowSource,
    expression: Option<Expression>,
    declared: Vec<usize>,
    current_left: Option<Row>,
    matched: bool,
    counter: u64,
    failed: bool,
}

impl LeftJoinRowSource {
    pub fn new(
        context: Rc<EvalContext>,
        left: BoxRowSource,
        right: BoxRowSource,
        expression: Option<Expression>,
    ) -> Self {
        Self {
            context,
            left,
            right,
            expression,
            declared: Vec::new(),
            current_left: None,
            matched: false,
            counter: 0,
            failed: false,
        }
    }

    fn next_left(&mut self) -> Result<bool, EvaluationError> {
        match self.left.read_row()? {
            Some(row) => {
                if self.current_left.is_some() {
                    self.right.reset()?;
                }
                self.current_left = Some(row);
                self.matched = false;
                Ok(true)
            }
            None => {
                self.current_left = None;
                Ok(false)
            }
        }
    }

    fn emit(&mut self, mut row: Row) -> Row {
        row.set_offset(self.counter);
        self.counter += 1;
        row
    }

    fn read_row_inner(&mut self) -> Result<Option<Row>, EvaluationError> {
        loop {
            if self.current_left.is_none() && !self.next_left()? {
                return Ok(None);
            }
            while let Some(right_row) = self.right.read_row()? {
                let merged = self
                    .current_left
                    .as_ref()
                    .and_then(|left_row| left_row.combine_with(&right_row));
                let Some(merged) = merged else { continue };
                // The filter runs over the merged bindings; an absent
                // filter is true and an erroring one is false
                let keep = match &self.expression {
                    None => true,
                    Some(expression) => {
                        match evaluate_expression(expression, &merged, &self.context) {
                            Ok(Some(term)) => effective_boolean_value(&term).unwrap_or(false),
                            Ok(None) | Err(_) => false,
                        }
                    }
                };
                if keep {
                    self.matched = true;
                    return Ok(Some(self.emit(merged)));
                }
            }
            // Right side exhausted: the optional fallback
            let fallback = if self.matched {
                None
            } else {
                self.current_left.clone()
            };
            if !self.next_left()? {
                return Ok(fallback.map(|row| self.emit(row)));
            }
            if let Some(row) = fallback {
                return Ok(Some(self.emit(row)));
            }
        }
    }
}

impl RowSource for LeftJoinRowSource {
    fn ensure_variables(&mut self) -> Result<(), EvaluationError> {
        self.left.ensure_variables()?;
        self.right.ensure_variables()?;
        if self.declared.is_empty() {
            self.declared = union_of_variables(self.left.variables(), self.right.variables());
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
        self.left.reset()?;
        self.right.reset()?;
        self.current_left = None;
        self.matched = false;
        self.counter = 0;
        self.failed = false;
        Ok(())
    }

    fn inner_rowsource(&self, index: usize) -> Option<&dyn RowSource> {
        match index {
            0 => Some(&*self.left),
            1 => Some(&*self.right),
            _ => None,
        }
    }

    fn finish(&mut self) {
        self.left.finish();
        self.right.finish();
    }
}
