use crate::error::EvaluationError;
use crate::row::Row;
use crate::rowsource::{union_of_variables, BoxRowSource, RowSource};

/// `UNION`: all the left rows followed by all the right rows, each widened
/// to the union of the declared variables (absent ones stay unbound).
pub(crate) struct UnionRowSource {
    left: BoxRowSource,
    right: BoxRowSource,
    declared: Vec<usize>,
    on_right: bool,
    counter: u64,
    failed: bool,
}

impl UnionRowSource {
    pub fn new(left: BoxRowSource, right: BoxRowSource) -> Self {
        Self {
            left,
            right,
            declared: Vec::new(),
            on_right: false,
            counter: 0,
            failed: false,
        }
    }
}

impl RowSource for UnionRowSource {
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
        let result = (|| {
            if !self.on_right {
                if let Some(row) = self.left.read_row()? {
                    return Ok(Some(row));
                }
                self.on_right = true;
            }
            self.right.read_row()
        })();
        match result {
            Ok(Some(mut row)) => {
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
        self.left.reset()?;
        self.right.reset()?;
        self.on_right = false;
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
