use crate::error::EvaluationError;
use crate::row::Row;
use crate::rowsource::{BoxRowSource, RowSource};

/// `LIMIT`/`OFFSET`: discards the first `offset` child rows, emits up to
/// `limit` rows, then terminates.
pub(crate) struct SliceRowSource {
    child: BoxRowSource,
    offset: usize,
    limit: Option<usize>,
    skipped: bool,
    emitted: usize,
    counter: u64,
    failed: bool,
}

impl SliceRowSource {
    pub fn new(child: BoxRowSource, offset: usize, limit: Option<usize>) -> Self {
        Self {
            child,
            offset,
            limit,
            skipped: false,
            emitted: 0,
            counter: 0,
            failed: false,
        }
    }
}

impl RowSource for SliceRowSource {
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
        let result = (|| {
            if self.limit.is_some_and(|limit| self.emitted >= limit) {
                return Ok(None);
            }
            if !self.skipped {
                for _ in 0..self.offset {
                    if self.child.read_row()?.is_none() {
                        break;
                    }
                }
                self.skipped = true;
            }
            self.child.read_row()
        })();
        match result {
            Ok(Some(mut row)) => {
                self.emitted += 1;
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
        self.child.reset()?;
        self.skipped = false;
        self.emitted = 0;
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
