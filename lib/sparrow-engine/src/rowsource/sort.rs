use crate::context::EvalContext;
use crate::error::EvaluationError;
use crate::expression::evaluate_expression;
use crate::row::Row;
use crate::rowsource::{BoxRowSource, RowSource};
use crate::value::order_cmp;
use sparrow_algebra::OrderExpression;
use sparrow_model::Term;
use std::cmp::Ordering;
use std::rc::Rc;

/// `ORDER BY`: materialises the child and stable-sorts it by the ordered
/// condition list.
///
/// Per condition, an expression error sorts like an unbound value, below
/// everything; when every condition ties, the original child offsets keep
/// the order deterministic (the sort is stable).
pub(crate) struct SortRowSource {
    context: Rc<EvalContext>,
    child: BoxRowSource,
    conditions: Vec<OrderExpression>,
    sorted: Option<Vec<Row>>,
    cursor: usize,
    failed: bool,
}

impl SortRowSource {
    pub fn new(
        context: Rc<EvalContext>,
        child: BoxRowSource,
        conditions: Vec<OrderExpression>,
    ) -> Self {
        Self {
            context,
            child,
            conditions,
            sorted: None,
            cursor: 0,
            failed: false,
        }
    }

    /// Consumes the child and sorts; after this the operator behaves as a
    /// materialised row sequence.
    fn materialise(&mut self) -> Result<(), EvaluationError> {
        let rows = self.child.read_all_rows()?;
        // Evaluate the key vector of every row once
        let mut keyed: Vec<(Vec<Option<Term>>, Row)> = rows
            .into_iter()
            .map(|row| {
                let keys = self
                    .conditions
                    .iter()
                    .map(|condition| {
                        evaluate_expression(condition.expression(), &row, &self.context)
                            .unwrap_or(None)
                    })
                    .collect();
                (keys, row)
            })
            .collect();
        let conditions = &self.conditions;
        keyed.sort_by(|(a_keys, _), (b_keys, _)| {
            for (index, condition) in conditions.iter().enumerate() {
                let ordering = order_cmp(a_keys[index].as_ref(), b_keys[index].as_ref());
                let ordering = if condition.is_descending() {
                    ordering.reverse()
                } else {
                    ordering
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
        self.sorted = Some(
            keyed
                .into_iter()
                .enumerate()
                .map(|(offset, (_, mut row))| {
                    row.set_offset(offset as u64);
                    row
                })
                .collect(),
        );
        self.cursor = 0;
        Ok(())
    }
}

impl RowSource for SortRowSource {
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
        if self.sorted.is_none() {
            if let Err(e) = self.materialise() {
                self.failed = true;
                return Err(e);
            }
        }
        let Some(sorted) = &self.sorted else {
            return Ok(None);
        };
        match sorted.get(self.cursor) {
            Some(row) => {
                self.cursor += 1;
                Ok(Some(row.clone()))
            }
            None => Ok(None),
        }
    }

    fn reset(&mut self) -> Result<(), EvaluationError> {
        // The materialised sequence is kept; only the cursor rewinds
        self.cursor = 0;
        self.failed = false;
        Ok(())
    }

    fn inner_rowsource(&self, index: usize) -> Option<&dyn RowSource> {
        (index == 0).then(|| &*self.child)
    }

    fn finish(&mut self) {
        self.sorted = None;
        self.child.finish();
    }
}
