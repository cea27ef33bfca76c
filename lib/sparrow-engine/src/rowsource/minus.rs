use crate::error::EvaluationError;
use crate::row::Row;
use crate::rowsource::{BoxRowSource, RowSource};

/// SPARQL `MINUS`: a left row is dropped iff some right row shares at
/// least one bound variable with it and agrees on every shared one.
///
/// Vacuously compatible right rows, sharing no bound variable, do NOT
/// cause removal.
pub(crate) struct MinusRowSource {
    left: BoxRowSource,
    right: BoxRowSource,
    started: bool,
    counter: u64,
    failed: bool,
}

impl MinusRowSource {
    pub fn new(left: BoxRowSource, right: BoxRowSource) -> Self {
        Self {
            left,
            right,
            started: false,
            counter: 0,
            failed: false,
        }
    }

    fn read_row_inner(&mut self) -> Result<Option<Row>, EvaluationError> {
        loop {
            let Some(mut left_row) = self.left.read_row()? else {
                return Ok(None);
            };
            if self.started {
                self.right.reset()?;
            }
            self.started = true;
            let mut removed = false;
            while let Some(right_row) = self.right.read_row()? {
                if left_row.shares_bound_variable(&right_row)
                    && left_row.is_compatible_with(&right_row)
                {
                    removed = true;
                    break;
                }
            }
            if !removed {
                left_row.set_offset(self.counter);
                self.counter += 1;
                return Ok(Some(left_row));
            }
        }
    }
}

impl RowSource for MinusRowSource {
    fn ensure_variables(&mut self) -> Result<(), EvaluationError> {
        self.left.ensure_variables()?;
        self.right.ensure_variables()
    }

    /// Only the left-side variables: the right side of a minus binds
    /// nothing downstream.
    fn variables(&self) -> &[usize] {
        self.left.variables()
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
        self.started = false;
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
