use crate::error::EvaluationError;
use crate::row::Row;
use crate::rowsource::{BoxRowSource, RowSource};

/// Projection onto an explicit variable sequence.
///
/// A projected variable the child never binds stays registered (so its
/// column exists) and is unbound in every output row.
pub(crate) struct ProjectRowSource {
    child: BoxRowSource,
    declared: Vec<usize>,
    counter: u64,
    failed: bool,
}

impl ProjectRowSource {
    pub fn new(child: BoxRowSource, projection: Vec<usize>) -> Self {
        Self {
            child,
            declared: projection,
            counter: 0,
            failed: false,
        }
    }
}

impl RowSource for ProjectRowSource {
    fn ensure_variables(&mut self) -> Result<(), EvaluationError> {
        self.child.ensure_variables()
    }

    fn variables(&self) -> &[usize] {
        &self.declared
    }

    fn read_row(&mut self) -> Result<Option<Row>, EvaluationError> {
        if self.failed {
            return Ok(None);
        }
        match self.child.read_row() {
            Ok(Some(row)) => {
                let mut projected = row.restricted_to(&self.declared);
                projected.set_offset(self.counter);
                self.counter += 1;
                Ok(Some(projected))
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
