use crate::error::EvaluationError;
use crate::row::Row;
use crate::rowsource::{BoxRowSource, RowSource};
use rustc_hash::FxHashSet;
use sparrow_model::Term;

/// Streaming duplicate elimination keyed by the same-term tuple over all
/// declared columns: the first occurrence of each distinct row survives in
/// its original relative position.
pub(crate) struct DistinctRowSource {
    child: BoxRowSource,
    seen: FxHashSet<Vec<Option<Term>>>,
    counter: u64,
    failed: bool,
}

impl DistinctRowSource {
    pub fn new(child: BoxRowSource) -> Self {
        Self {
            child,
            seen: FxHashSet::default(),
            counter: 0,
            failed: false,
        }
    }
}

impl RowSource for DistinctRowSource {
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
            let row = match self.child.read_row() {
                Ok(Some(row)) => row,
                Ok(None) => return Ok(None),
                Err(e) => {
                    self.failed = true;
                    return Err(e);
                }
            };
            let key = row.values_at(self.child.variables());
            if self.seen.insert(key) {
                let mut row = row;
                row.set_offset(self.counter);
                self.counter += 1;
                return Ok(Some(row));
            }
        }
    }

    fn reset(&mut self) -> Result<(), EvaluationError> {
        self.seen.clear();
        self.counter = 0;
        self.failed = false;
        self.child.reset()
    }

    fn inner_rowsource(&self, index: usize) -> Option<&dyn RowSource> {
        (index == 0).then(|| &*self.child)
    }

    fn finish(&mut self) {
        self.seen.clear();
        self.child.finish();
    }
}

/// `REDUCED`: the cheap variant suppressing adjacent duplicates only, with
/// a window of one row.
pub(crate) struct ReducedRowSource {
    child: BoxRowSource,
    last: Option<Vec<Option<Term>>>,
    counter: u64,
    failed: bool,
}

impl ReducedRowSource {
    pub fn new(child: BoxRowSource) -> Self {
        Self {
            child,
            last: None,
            counter: 0,
            failed: false,
        }
    }
}

impl RowSource for ReducedRowSource {
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
            let row = match self.child.read_row() {
                Ok(Some(row)) => row,
                Ok(None) => return Ok(None),
                Err(e) => {
                    self.failed = true;
                    return Err(e);
                }
            };
            let key = row.values_at(self.child.variables());
            if self.last.as_ref() != Some(&key) {
                self.last = Some(key);
                let mut row = row;
                row.set_offset(self.counter);
                self.counter += 1;
                return Ok(Some(row));
            }
        }
    }

    fn reset(&mut self) -> Result<(), EvaluationError> {
        self.last = None;
        self.counter = 0;
        self.failed = false;
        self.child.reset()
    }

    fn inner_rowsource(&self, index: usize) -> Option<&dyn RowSource> {
        (index == 0).then(|| &*self.child)
    }

    fn finish(&mut self) {
        self.last = None;
        self.child.finish();
    }
}
