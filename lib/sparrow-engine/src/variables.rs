use rustc_hash::FxHashMap;
use sparrow_model::Variable;
use std::cell::RefCell;
use std::rc::Rc;

/// The process-of-query variable registry.
///
/// Every variable of a prepared query gets a stable column offset here, and
/// every row and rowsource of that query addresses bindings through those
/// offsets. The table is only grown during translation; execution reads it.
///
/// Cloning gives another handle onto the same shared table.
#[derive(Clone, Default)]
pub struct VariableTable(Rc<RefCell<VariableTableInner>>);

#[derive(Default)]
struct VariableTableInner {
    variables: Vec<Variable>,
    index: FxHashMap<String, usize>,
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The offset of the variable, registering it when not yet present.
    pub fn declare(&self, variable: &Variable) -> usize {
        let mut inner = self.0.borrow_mut();
        if let Some(offset) = inner.index.get(variable.as_str()) {
            return *offset;
        }
        let offset = inner.variables.len();
        inner.variables.push(variable.clone());
        inner.index.insert(variable.as_str().to_owned(), offset);
        offset
    }

    /// The offset of an already registered variable.
    pub fn offset(&self, name: &str) -> Option<usize> {
        self.0.borrow().index.get(name).copied()
    }

    /// The variable registered at the given offset.
    pub fn variable(&self, offset: usize) -> Option<Variable> {
        self.0.borrow().variables.get(offset).cloned()
    }

    /// A snapshot of all registered variables, in offset order.
    pub fn variables(&self) -> Vec<Variable> {
        self.0.borrow().variables.clone()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().variables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declare_is_idempotent_and_offsets_are_stable() {
        let table = VariableTable::new();
        let x = Variable::new_unchecked("x");
        let y = Variable::new_unchecked("y");
        assert_eq!(table.declare(&x), 0);
        assert_eq!(table.declare(&y), 1);
        assert_eq!(table.declare(&x), 0);
        assert_eq!(table.offset("y"), Some(1));
        assert_eq!(table.offset("z"), None);
        assert_eq!(table.variable(1), Some(y));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn clones_share_the_registry() {
        let table = VariableTable::new();
        let handle = table.clone();
        handle.declare(&Variable::new_unchecked("x"));
        assert_eq!(table.offset("x"), Some(0));
    }
}
