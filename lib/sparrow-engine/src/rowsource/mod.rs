//! The rowsource pipeline: polymorphic lazy iterators of solution rows.
//!
//! Concrete operators compose into a tree rooted at the query-results
//! façade; `read_row` pulls one row at a time, suspension is implicit in
//! the single-threaded pull model.

mod distinct;
mod extend;
mod filter;
mod graph;
mod group;
mod join;
mod left_join;
mod minus;
mod project;
mod sequence;
mod service;
mod slice;
mod sort;
mod triples;
mod union;

pub(crate) use self::distinct::{DistinctRowSource, ReducedRowSource};
pub(crate) use self::extend::ExtendRowSource;
pub(crate) use self::filter::FilterRowSource;
pub(crate) use self::graph::{GraphOrigin, GraphRowSource};
pub(crate) use self::group::GroupRowSource;
pub(crate) use self::join::JoinRowSource;
pub(crate) use self::left_join::LeftJoinRowSource;
pub(crate) use self::minus::MinusRowSource;
pub(crate) use self::project::ProjectRowSource;
pub(crate) use self::sequence::RowSequenceRowSource;
pub(crate) use self::service::ServiceRowSource;
pub(crate) use self::slice::SliceRowSource;
pub(crate) use self::sort::SortRowSource;
pub(crate) use self::triples::TriplesRowSource;
pub(crate) use self::union::UnionRowSource;

use crate::error::EvaluationError;
use crate::row::Row;

/// A lazy iterator of solution rows, the engine's unit of composition.
///
/// The protocol: [`RowSource::ensure_variables`] is called (possibly more
/// than once, it must be idempotent) before the first row is read;
/// [`RowSource::read_row`] yields rows until `Ok(None)`;
/// [`RowSource::reset`] restarts the iteration when the operator supports
/// it; [`RowSource::finish`] releases held resources and is idempotent.
///
/// Every row produced carries a sequence offset that increases from 0 per
/// rowsource, and addresses its bindings through the query-wide
/// [`crate::VariableTable`].
pub trait RowSource {
    /// Populates the declared-variables sequence; idempotent.
    fn ensure_variables(&mut self) -> Result<(), EvaluationError>;

    /// The variable-table offsets this rowsource declares, in declaration
    /// order. Only valid after [`RowSource::ensure_variables`].
    fn variables(&self) -> &[usize];

    /// The number of declared variables.
    fn width(&self) -> usize {
        self.variables().len()
    }

    /// The next row, or `None` at the end of the iteration.
    ///
    /// A returned error means the iteration failed; the rowsource flags
    /// itself and yields `Ok(None)` from then on.
    fn read_row(&mut self) -> Result<Option<Row>, EvaluationError>;

    /// All remaining rows; equivalent to calling [`RowSource::read_row`]
    /// until exhaustion.
    fn read_all_rows(&mut self) -> Result<Vec<Row>, EvaluationError> {
        let mut rows = Vec::new();
        while let Some(row) = self.read_row()? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Returns the iterator to its start.
    fn reset(&mut self) -> Result<(), EvaluationError> {
        Err(EvaluationError::ResetUnsupported)
    }

    /// Downstream hints an operator may exploit; advisory, the default
    /// implementation ignores them.
    fn set_requirements(&mut self, _requirements: Requirements) {}

    /// The n-th child operator, for introspection and planning.
    fn inner_rowsource(&self, _index: usize) -> Option<&dyn RowSource> {
        None
    }

    /// Releases held resources; called by the façade teardown, idempotent.
    fn finish(&mut self) {}
}

pub(crate) type BoxRowSource = Box<dyn RowSource>;

/// Hint bits a consumer can push upstream through
/// [`RowSource::set_requirements`].
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct Requirements {
    /// The consumer will discard duplicate rows anyway.
    pub distinct: bool,
    /// The consumer does not rely on the producer's row order.
    pub unordered: bool,
}

/// Merges the declared variables of two children, keeping declaration order.
pub(crate) fn union_of_variables(left: &[usize], right: &[usize]) -> Vec<usize> {
    let mut result = left.to_vec();
    for &offset in right {
        if !result.contains(&offset) {
            result.push(offset);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use sparrow_model::Literal;

    fn sequence(values: &[&str]) -> RowSequenceRowSource {
        let rows = values
            .iter()
            .map(|value| {
                let mut row = Row::new();
                row.set(0, Literal::new_simple_literal(*value).into());
                row
            })
            .collect();
        RowSequenceRowSource::new(vec![0], rows)
    }

    #[test]
    fn read_all_rows_matches_repeated_read_row() {
        let mut a = sequence(&["1", "2", "3"]);
        let mut b = sequence(&["1", "2", "3"]);
        let all = a.read_all_rows().unwrap();
        let mut one_by_one = Vec::new();
        while let Some(row) = b.read_row().unwrap() {
            one_by_one.push(row);
        }
        assert_eq!(all, one_by_one);
    }

    #[test]
    fn offsets_are_monotonic_from_zero() {
        let mut source = sequence(&["a", "b", "c"]);
        let offsets: Vec<u64> = source
            .read_all_rows()
            .unwrap()
            .iter()
            .map(Row::offset)
            .collect();
        assert_eq!(offsets, vec![0, 1, 2]);
    }

    #[test]
    fn reset_restarts_the_iteration() {
        let mut source = sequence(&["a", "b"]);
        assert_eq!(source.read_all_rows().unwrap().len(), 2);
        assert!(source.read_row().unwrap().is_none());
        source.reset().unwrap();
        assert_eq!(source.read_all_rows().unwrap().len(), 2);
    }

    #[test]
    fn finish_twice_is_a_no_op() {
        let mut source = sequence(&["a"]);
        source.finish();
        source.finish();
        assert!(source.read_row().unwrap().is_none());
    }

    #[test]
    fn union_of_variables_keeps_declaration_order() {
        assert_eq!(union_of_variables(&[2, 0], &[1, 0, 3]), vec![2, 0, 1, 3]);
    }
}
