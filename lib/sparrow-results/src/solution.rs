//! The [`QuerySolution`] row type shared by the engine and the format writers.

use sparrow_model::{Term, Variable};
use std::fmt;
use std::ops::Index;
use std::sync::Arc;

/// Tuple associating variables and terms that are the result of a SPARQL query.
///
/// It is the equivalent of a row in SQL.
///
/// ```
/// use sparrow_model::{Literal, Variable};
/// use sparrow_results::QuerySolution;
///
/// let solution = QuerySolution::from((
///     vec![Variable::new("foo")?, Variable::new("bar")?],
///     vec![Some(Literal::from(1i64).into()), None],
/// ));
/// assert_eq!(solution.get("foo"), Some(&Literal::from(1i64).into()));
/// assert_eq!(solution.get("bar"), None);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Clone)]
pub struct QuerySolution {
    variables: Arc<[Variable]>,
    values: Vec<Option<Term>>,
}

impl QuerySolution {
    /// Returns a value for a given position ([`usize`]) or variable name (`&str` or [`Variable`]).
    #[inline]
    pub fn get(&self, index: impl VariableSolutionIndex) -> Option<&Term> {
        self.values.get(index.index(self)?).and_then(Option::as_ref)
    }

    /// The number of columns in the solutions table, bound or not.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Is there any variable bound in this row?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    /// Iterates over the bound (variable, value) pairs of this row.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &Term)> {
        self.into_iter()
    }

    /// The ordered slice of values, one per column.
    #[inline]
    pub fn values(&self) -> &[Option<Term>] {
        &self.values
    }

    #[inline]
    pub fn into_values(self) -> Vec<Option<Term>> {
        self.values
    }

    /// The ordered slice of the solution variables, bound or not.
    #[inline]
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }
}

impl<V: Into<Arc<[Variable]>>, S: Into<Vec<Option<Term>>>> From<(V, S)> for QuerySolution {
    #[inline]
    fn from((variables, values): (V, S)) -> Self {
        Self {
            variables: variables.into(),
            values: values.into(),
        }
    }
}

impl<'a> IntoIterator for &'a QuerySolution {
    type Item = (&'a Variable, &'a Term);
    type IntoIter = Iter<'a>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        Iter {
            inner: self.variables.iter().zip(&self.values),
        }
    }
}

impl Index<usize> for QuerySolution {
    type Output = Term;

    #[inline]
    fn index(&self, index: usize) -> &Term {
        self.get(index)
            .unwrap_or_else(|| panic!("The column {index} is not set in this solution"))
    }
}

impl Index<&str> for QuerySolution {
    type Output = Term;

    #[inline]
    fn index(&self, index: &str) -> &Term {
        self.get(index)
            .unwrap_or_else(|| panic!("The variable ?{index} is not set in this solution"))
    }
}

impl PartialEq for QuerySolution {
    fn eq(&self, other: &Self) -> bool {
        for (k, v) in self.iter() {
            if other.get(k) != Some(v) {
                return false;
            }
        }
        for (k, v) in other.iter() {
            if self.get(k) != Some(v) {
                return false;
            }
        }
        true
    }
}

impl Eq for QuerySolution {}

impl fmt::Debug for QuerySolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// An iterator over the bound (variable, value) pairs of a [`QuerySolution`].
pub struct Iter<'a> {
    inner: std::iter::Zip<std::slice::Iter<'a, Variable>, std::slice::Iter<'a, Option<Term>>>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a Variable, &'a Term);

    fn next(&mut self) -> Option<Self::Item> {
        for (variable, value) in &mut self.inner {
            if let Some(value) = value {
                return Some((variable, value));
            }
        }
        None
    }
}

/// A way to get a value in a [`QuerySolution`]: a column index or a variable name.
pub trait VariableSolutionIndex {
    fn index(self, solution: &QuerySolution) -> Option<usize>;
}

impl VariableSolutionIndex for usize {
    #[inline]
    fn index(self, _: &QuerySolution) -> Option<usize> {
        Some(self)
    }
}

impl VariableSolutionIndex for &str {
    #[inline]
    fn index(self, solution: &QuerySolution) -> Option<usize> {
        solution.variables.iter().position(|v| v.as_str() == self)
    }
}

impl VariableSolutionIndex for &Variable {
    #[inline]
    fn index(self, solution: &QuerySolution) -> Option<usize> {
        solution.variables.iter().position(|v| v == self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sparrow_model::Literal;

    #[test]
    fn equality_ignores_column_order() {
        let a = QuerySolution::from((
            vec![Variable::new_unchecked("x"), Variable::new_unchecked("y")],
            vec![Some(Literal::from("1").into()), None],
        ));
        let b = QuerySolution::from((
            vec![Variable::new_unchecked("y"), Variable::new_unchecked("x")],
            vec![None, Some(Literal::from("1").into())],
        ));
        assert_eq!(a, b);
    }
}
