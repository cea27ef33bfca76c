use sparrow_model::Term;

/// One solution row: a sparse vector of optional terms indexed by the
/// offsets of the shared [`crate::VariableTable`], plus the sequence number
/// the producing rowsource stamped on it.
///
/// `None` at an offset means the variable is unbound in this row; that is
/// not an error and not the empty string.
#[derive(Debug, Clone, Default, Eq, PartialEq, Hash)]
pub struct Row {
    values: Vec<Option<Term>>,
    offset: u64,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
            offset: 0,
        }
    }

    /// The sequence number assigned by the rowsource that emitted this row.
    #[inline]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    #[inline]
    pub fn set_offset(&mut self, offset: u64) {
        self.offset = offset;
    }

    /// The binding at the given variable-table offset.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Term> {
        self.values.get(index).and_then(Option::as_ref)
    }

    #[inline]
    pub fn is_bound(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    /// Binds the variable at the given offset, growing the row as needed.
    pub fn set(&mut self, index: usize, value: Term) {
        if self.values.len() <= index {
            self.values.resize(index + 1, None);
        }
        self.values[index] = Some(value);
    }

    pub fn unset(&mut self, index: usize) {
        if let Some(value) = self.values.get_mut(index) {
            *value = None;
        }
    }

    /// Iterates over the bound (offset, term) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Term)> {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| Some((i, v.as_ref()?)))
    }

    /// Do the two rows share at least one bound variable?
    pub fn shares_bound_variable(&self, other: &Self) -> bool {
        self.values
            .iter()
            .zip(&other.values)
            .any(|(a, b)| a.is_some() && b.is_some())
    }

    /// Compatibility in the SPARQL sense: every variable bound in both rows
    /// carries the same term (the same-term relation, not value equality).
    pub fn is_compatible_with(&self, other: &Self) -> bool {
        self.values
            .iter()
            .zip(&other.values)
            .all(|(a, b)| match (a, b) {
                (Some(a), Some(b)) => a == b,
                _ => true,
            })
    }

    /// The union of the bindings of two compatible rows, or `None` when a
    /// shared variable disagrees.
    pub fn combine_with(&self, other: &Self) -> Option<Self> {
        let (longer, shorter) = if self.values.len() >= other.values.len() {
            (self, other)
        } else {
            (other, self)
        };
        let mut result = longer.values.clone();
        for (index, value) in shorter.values.iter().enumerate() {
            let Some(value) = value else { continue };
            match &result[index] {
                Some(existing) => {
                    if existing != value {
                        return None;
                    }
                }
                None => result[index] = Some(value.clone()),
            }
        }
        Some(Self {
            values: result,
            offset: self.offset,
        })
    }

    /// A new row keeping only the given offsets, for projection and
    /// duplicate-elimination keys.
    pub fn restricted_to(&self, offsets: &[usize]) -> Self {
        let mut result = Self::new();
        for &offset in offsets {
            if let Some(value) = self.get(offset) {
                result.set(offset, value.clone());
            }
        }
        result.offset = self.offset;
        result
    }

    /// The bound values at the given offsets, in order; `None` for unbound.
    pub fn values_at(&self, offsets: &[usize]) -> Vec<Option<Term>> {
        offsets.iter().map(|&i| self.get(i).cloned()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sparrow_model::Literal;

    fn term(value: &str) -> Term {
        Literal::new_simple_literal(value).into()
    }

    #[test]
    fn compatible_rows_merge() {
        let mut left = Row::new();
        left.set(0, term("v1"));
        let mut right = Row::new();
        right.set(0, term("v1"));
        right.set(1, term("v2"));
        let merged = left.combine_with(&right).unwrap();
        assert_eq!(merged.get(0), Some(&term("v1")));
        assert_eq!(merged.get(1), Some(&term("v2")));
    }

    #[test]
    fn incompatible_rows_do_not_merge()  {
        let mut left = Row::new();
        left.set(0, term("v1"));
        let mut right = Row::new();
        right.set(0, term("v2"));
        assert!(left.combine_with(&right).is_none());
        assert!(!left.is_compatible_with(&right));
    }

    #[test]
    fn disjoint_rows_are_vacuously_compatible() {
        let mut left = Row::new();
        left.set(0, term("v1"));
        let mut right = Row::new();
        right.set(1, term("v2"));
        assert!(left.is_compatible_with(&right));
        assert!(!left.shares_bound_variable(&right));
        let merged = left.combine_with(&right).unwrap();
        assert_eq!(merged.get(0), Some(&term("v1")));
        assert_eq!(merged.get(1), Some(&term("v2")));
    }

    #[test]
    fn unbound_on_one_side_is_compatible() {
        let mut left = Row::new();
        left.set(0, term("v1"));
        left.set(1, term("v2"));
        let mut right = Row::new();
        right.set(1, term("v2"));
        assert!(left.is_compatible_with(&right));
        assert!(left.shares_bound_variable(&right));
    }

    #[test]
    fn restriction_keeps_only_requested_offsets() {
        let mut row = Row::new();
        row.set(0, term("a"));
        row.set(2, term("c"));
        let restricted = row.restricted_to(&[0, 1]);
        assert_eq!(restricted.get(0), Some(&term("a")));
        assert_eq!(restricted.get(1), None);
        assert_eq!(restricted.get(2), None);
    }
}
