use crate::error::EvaluationError;
use crate::row::Row;
use crate::rowsource::{union_of_variables, BoxRowSource, RowSource};

/// The inner join: a nested loop with the shared-variable compatibility
/// check, the right side reset between left rows.
///
/// Left-row ordering is preserved, and the relative order of right rows is
/// preserved within each left partition.
pub(crate) struct JoinRowSource {
    left: BoxRowSource,
    right: BoxRowSource,
    declared: Vec<usize>,
    current_left: Option<Row>,
    counter: u64,
    failed: bool,
}

impl JoinRowSource {
    pub fn new(left: BoxRowSource, right: BoxRowSource) -> Self {
        Self {
            left,
            right,
            declared: Vec::new(),
            current_left: None,
            counter: 0,
            failed: false,
        }
    }

    /// Pulls the next left row, restarting the right side for it.
    fn next_left(&mut self) -> Result<bool, EvaluationError> {
        match self.left.read_row()? {
            Some(row) => {
                if self.current_left.is_some() {
                    // Not the first partition: restart the right side
                    self.right.reset()?;
                }
                self.current_left = Some(row);
                Ok(true)
            }
            None => {
                self.current_left = None;
                Ok(false)
            }
        }
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
                if let Some(mut merged) = merged {
                    merged.set_offset(self.counter);
                    self.counter += 1;
                    return Ok(Some(merged));
                }
            }
            // Right side exhausted for this left row
            if !self.next_left()? {
                return Ok(None);
            }
        }
    }
}

impl RowSource for JoinRowSource {
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
