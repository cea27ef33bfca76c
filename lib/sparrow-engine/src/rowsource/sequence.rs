use crate::error::EvaluationError;
use crate::row::Row;
use crate::rowsource::RowSource;

/// A materialised sequence of rows with its declared variables.
///
/// Backs `VALUES` blocks, eagerly evaluated `ORDER BY` results and unit
/// tests.
pub(crate) struct RowSequenceRowSource {
    declared: Vec<usize>,
    rows: Vec<Row>,
    cursor: usize,
    counter: u64,
}

impl RowSequenceRowSource {
    pub fn new(declared: Vec<usize>, rows: Vec<Row>) -> Self {
        Self {
            declared,
            rows,
            cursor: 0,
            counter: 0,
        }
    }
}

impl RowSource for RowSequenceRowSource {
    fn ensure_variables(&mut self) -> Result<(), EvaluationError> {
        Ok(())
    }

    fn variables(&self) -> &[usize] {
        &self.declared
    }

    fn read_row(&mut self) -> Result<Option<Row>, EvaluationError> {
        match self.rows.get(self.cursor) {
            Some(row) => {
                self.cursor += 1;
                let mut row = row.clone();
                row.set_offset(self.counter);
                self.counter += 1;
                Ok(Some(row))
            }
            None => Ok(None),
        }
    }

    fn reset(&mut self) -> Result<(), EvaluationError> {
        self.cursor = 0;
        self.counter = 0;
        Ok(())
    }

    fn finish(&mut self) {
        self.rows.clear();
        self.cursor = 0;
    }
}
