use crate::error::ExpressionError;
use crate::random::RandomState;
use crate::source::TriplesSource;
use crate::variables::VariableTable;
use regex::{Regex, RegexBuilder};
use rustc_hash::FxHashMap;
use sparrow_model::xsd::DateTime;
use sparrow_model::{BlankNode, Term};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

const REGEX_SIZE_LIMIT: usize = 1_000_000;

/// The state shared by every rowsource and expression evaluation of one
/// query execution: the triples source, the variables table, the query's
/// `NOW()` instant, the blank-node and random state, the dynamically scoped
/// active graph and the compiled-regex cache.
///
/// Everything here is single-threaded by design; interior mutability is
/// plain `Cell`/`RefCell`.
pub struct EvalContext {
    pub(crate) source: Rc<dyn TriplesSource>,
    pub(crate) variables: VariableTable,
    pub(crate) now: DateTime,
    pub(crate) base_iri: Option<String>,
    pub(crate) random: RefCell<RandomState>,
    bnode_counter: Cell<u64>,
    /// `None` means the default graph.
    pub(crate) active_graph: RefCell<Option<Term>>,
    regex_cache: RefCell<FxHashMap<(String, String), Rc<Regex>>>,
}

impl EvalContext {
    pub(crate) fn new(
        source: Rc<dyn TriplesSource>,
        variables: VariableTable,
        base_iri: Option<String>,
    ) -> Self {
        Self {
            source,
            variables,
            now: DateTime::now(),
            base_iri,
            random: RefCell::new(RandomState::new()),
            bnode_counter: Cell::new(0),
            active_graph: RefCell::new(None),
            regex_cache: RefCell::new(FxHashMap::default()),
        }
    }

    /// A fresh blank node scoped to this query execution.
    pub(crate) fn fresh_bnode(&self) -> BlankNode {
        let id = self.bnode_counter.get();
        self.bnode_counter.set(id + 1);
        BlankNode::new_unchecked(format!("b{id}"))
    }

    /// A deterministic blank node label for `BNODE(str)`.
    pub(crate) fn derived_bnode(value: &str) -> BlankNode {
        BlankNode::new(value)
            .unwrap_or_else(|_| BlankNode::new_unchecked(format!("b{}", hex::encode(value))))
    }

    /// Compiles a regular expression with the SPARQL flags, caching the
    /// result for the lifetime of the execution.
    pub(crate) fn compile_regex(
        &self,
        pattern: &str,
        flags: &str,
    ) -> Result<Rc<Regex>, ExpressionError> {
        let key = (pattern.to_owned(), flags.to_owned());
        if let Some(regex) = self.regex_cache.borrow().get(&key) {
            return Ok(Rc::clone(regex));
        }
        let mut builder = RegexBuilder::new(pattern);
        builder.size_limit(REGEX_SIZE_LIMIT);
        for flag in flags.chars() {
            match flag {
                'i' => builder.case_insensitive(true),
                's' => builder.dot_matches_new_line(true),
                'm' => builder.multi_line(true),
                'x' => builder.ignore_whitespace(true),
                'q' => {
                    return Err(ExpressionError::RegexSyntax(
                        "the q flag is not supported".to_owned(),
                    ));
                }
                _ => {
                    return Err(ExpressionError::RegexSyntax(format!(
                        "unknown regular expression flag: {flag}"
                    )));
                }
            };
        }
        let regex = Rc::new(
            builder
                .build()
                .map_err(|e| ExpressionError::RegexSyntax(e.to_string()))?,
        );
        self.regex_cache
            .borrow_mut()
            .insert(key, Rc::clone(&regex));
        Ok(regex)
    }

    /// Drops the regex cache and other transient resources; called by the
    /// query-results `finish` hook.
    pub(crate) fn release(&self) {
        self.regex_cache.borrow_mut().clear();
    }
}
