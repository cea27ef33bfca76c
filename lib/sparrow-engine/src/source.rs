//! The pluggable triples-source interface: how the engine asks a concrete
//! RDF store for triple-pattern matches, plus the in-memory implementation
//! over [`sparrow_model::Dataset`].

use sparrow_model::{Dataset, GraphName, NamedNode, NamedOrBlankNode, Quad, Term};
use std::error::Error;
use std::fmt;
use std::rc::Rc;

/// Errors from a concrete store are opaque to the engine.
pub type SourceError = Box<dyn Error + Send + Sync>;

/// The triple positions, used as a bitmask in the match protocol.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub struct TriplePartsMask(u8);

impl TriplePartsMask {
    pub const EMPTY: Self = Self(0);
    pub const SUBJECT: Self = Self(1);
    pub const PREDICATE: Self = Self(2);
    pub const OBJECT: Self = Self(4);
    pub const GRAPH: Self = Self(8);

    #[inline]
    pub fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[inline]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for TriplePartsMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (mask, label) in [
            (Self::SUBJECT, 'S'),
            (Self::PREDICATE, 'P'),
            (Self::OBJECT, 'O'),
            (Self::GRAPH, 'G'),
        ] {
            if self.contains(mask) {
                f.write_fmt(format_args!("{label}"))?;
            }
        }
        Ok(())
    }
}

/// A triple pattern handed to the source: `None` positions are free and get
/// bound by the returned match iterator.
#[derive(Debug, Clone, Default)]
pub struct TripleQuery {
    pub subject: Option<Term>,
    pub predicate: Option<Term>,
    pub object: Option<Term>,
    /// `None` is the default graph; a named graph otherwise.
    pub graph: Option<Term>,
}

/// An iterator over the store triples matching one [`TripleQuery`].
///
/// The protocol is deliberately low-level so stores can expose cursors
/// without materialising: `bind_match` reads the current triple into the
/// caller's binding slots, `next_match` advances, `is_end` reports
/// exhaustion and `finish` releases store-side resources.
pub trait TriplesMatch {
    /// Binds the current match into `bindings` (subject, predicate, object,
    /// graph order), restricted to the positions of `parts`; returns the
    /// positions actually bound.
    fn bind_match(
        &self,
        bindings: &mut [Option<Term>; 4],
        parts: TriplePartsMask,
    ) -> Result<TriplePartsMask, SourceError>;

    fn next_match(&mut self);

    fn is_end(&self) -> bool;

    fn finish(&mut self) {}
}

/// Capabilities a source can advertise.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[non_exhaustive]
pub enum SourceFeature {
    /// The source can enumerate its named graphs exactly.
    GraphEnumeration,
}

/// A store-bound object exposing triple-pattern matching to the engine.
pub trait TriplesSource {
    /// Is this exact triple present in the given graph?
    fn triple_present(
        &self,
        subject: &Term,
        predicate: &Term,
        object: &Term,
        graph: Option<&Term>,
    ) -> Result<bool, SourceError>;

    /// Starts a match iteration for a pattern.
    fn init_triples_match(
        &self,
        query: &TripleQuery,
    ) -> Result<Box<dyn TriplesMatch>, SourceError>;

    fn support_feature(&self, _feature: SourceFeature) -> bool {
        false
    }

    /// The named graphs of the store, for `GRAPH ?g` enumeration.
    fn graph_names(&self) -> Result<Vec<Term>, SourceError> {
        Ok(Vec::new())
    }
}

/// How one data graph reaches the engine: a dereferenceable IRI or inline bytes.
#[derive(Debug, Clone)]
pub enum GraphData {
    Iri(NamedNode),
    Bytes {
        data: Vec<u8>,
        /// A parser format hint such as a media type, when known.
        format_hint: Option<String>,
    },
}

/// What a triples-source factory is asked to load.
#[derive(Debug, Clone)]
pub struct DataGraph {
    pub source: GraphData,
    pub base_iri: Option<String>,
    /// The graph name; required when `kind` is [`DataGraphKind::Named`].
    pub name: Option<NamedNode>,
    pub kind: DataGraphKind,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum DataGraphKind {
    /// Loaded into the named graph given by `name`.
    Named,
    /// Merged into the default (background) graph.
    #[default]
    Background,
}

/// Flags passed to a factory when creating a source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceFlags {
    /// The factory must not touch the network.
    pub no_network: bool,
}

/// The factory API versions this engine accepts.
pub const TRIPLES_SOURCE_API_MIN: u32 = 1;
/// See [`TRIPLES_SOURCE_API_MIN`].
pub const TRIPLES_SOURCE_API_MAX: u32 = 2;

/// A registered provider of [`TriplesSource`]s.
///
/// The version is negotiated at registration time: the engine refuses
/// factories outside [`TRIPLES_SOURCE_API_MIN`]..=[`TRIPLES_SOURCE_API_MAX`].
#[derive(Clone)]
pub struct TriplesSourceFactory {
    pub name: String,
    pub version: u32,
    #[allow(clippy::type_complexity)]
    pub make: Rc<dyn Fn(&[DataGraph], SourceFlags) -> Result<Rc<dyn TriplesSource>, SourceError>>,
}

impl fmt::Debug for TriplesSourceFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriplesSourceFactory")
            .field("name", &self.name)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

/// The built-in source over the in-memory [`Dataset`].
#[derive(Clone)]
pub struct MemoryTriplesSource {
    dataset: Rc<Dataset>,
}

impl MemoryTriplesSource {
    pub fn new(dataset: impl Into<Rc<Dataset>>) -> Self {
        Self {
            dataset: dataset.into(),
        }
    }

    fn to_graph_name(graph: Option<&Term>) -> Option<GraphName> {
        match graph {
            None => Some(GraphName::DefaultGraph),
            Some(Term::NamedNode(node)) => Some(GraphName::NamedNode(node.clone())),
            Some(Term::BlankNode(node)) => Some(GraphName::BlankNode(node.clone())),
            Some(Term::Literal(_)) => None,
        }
    }
}

impl TriplesSource for MemoryTriplesSource {
    fn triple_present(
        &self,
        subject: &Term,
        predicate: &Term,
        object: &Term,
        graph: Option<&Term>,
    ) -> Result<bool, SourceError> {
        let subject = match subject.clone().try_into() {
            Ok(subject) => subject,
            Err(_) => return Ok(false),
        };
        let Term::NamedNode(predicate) = predicate else {
            return Ok(false);
        };
        let Some(graph_name) = Self::to_graph_name(graph) else {
            return Ok(false);
        };
        Ok(self.dataset.contains(&Quad {
            subject,
            predicate: predicate.clone(),
            object: object.clone(),
            graph_name,
        }))
    }

    fn init_triples_match(
        &self,
        query: &TripleQuery,
    ) -> Result<Box<dyn TriplesMatch>, SourceError> {
        let subject: Option<NamedOrBlankNode> = match &query.subject {
            None => None,
            Some(term) => match term.clone().try_into() {
                Ok(subject) => Some(subject),
                // A literal subject can never match
                Err(_) => return Ok(Box::new(MemoryTriplesMatch { quads: Vec::new(), cursor: 0 })),
            },
        };
        let predicate = match &query.predicate {
            None => None,
            Some(Term::NamedNode(node)) => Some(node.clone()),
            Some(_) => return Ok(Box::new(MemoryTriplesMatch { quads: Vec::new(), cursor: 0 })),
        };
        let Some(graph_name) = Self::to_graph_name(query.graph.as_ref()) else {
            return Ok(Box::new(MemoryTriplesMatch { quads: Vec::new(), cursor: 0 }));
        };
        let quads = self
            .dataset
            .quads_for_pattern(
                subject.as_ref(),
                predicate.as_ref(),
                query.object.as_ref(),
                Some(&graph_name),
            )
            .cloned()
            .collect();
        Ok(Box::new(MemoryTriplesMatch { quads, cursor: 0 }))
    }

    fn support_feature(&self, feature: SourceFeature) -> bool {
        matches!(feature, SourceFeature::GraphEnumeration)
    }

    fn graph_names(&self) -> Result<Vec<Term>, SourceError> {
        Ok(self
            .dataset
            .graph_names()
            .into_iter()
            .filter_map(|name| match name {
                GraphName::NamedNode(node) => Some(Term::NamedNode(node)),
                GraphName::BlankNode(node) => Some(Term::BlankNode(node)),
                GraphName::DefaultGraph => None,
            })
            .collect())
    }
}

impl From<Dataset> for MemoryTriplesSource {
    fn from(dataset: Dataset) -> Self {
        Self::new(dataset)
    }
}

struct MemoryTriplesMatch {
    quads: Vec<Quad>,
    cursor: usize,
}

impl TriplesMatch for MemoryTriplesMatch {
    fn bind_match(
        &self,
        bindings: &mut [Option<Term>; 4],
        parts: TriplePartsMask,
    ) -> Result<TriplePartsMask, SourceError> {
        let Some(quad) = self.quads.get(self.cursor) else {
            return Ok(TriplePartsMask::EMPTY);
        };
        let mut bound = TriplePartsMask::EMPTY;
        if parts.contains(TriplePartsMask::SUBJECT) {
            bindings[0] = Some(quad.subject.clone().into());
            bound = bound.with(TriplePartsMask::SUBJECT);
        }
        if parts.contains(TriplePartsMask::PREDICATE) {
            bindings[1] = Some(quad.predicate.clone().into());
            bound = bound.with(TriplePartsMask::PREDICATE);
        }
        if parts.contains(TriplePartsMask::OBJECT) {
            bindings[2] = Some(quad.object.clone());
            bound = bound.with(TriplePartsMask::OBJECT);
        }
        if parts.contains(TriplePartsMask::GRAPH) && !quad.graph_name.is_default_graph() {
            bindings[3] = match &quad.graph_name {
                GraphName::NamedNode(node) => Some(node.clone().into()),
                GraphName::BlankNode(node) => Some(node.clone().into()),
                GraphName::DefaultGraph => None,
            };
            bound = bound.with(TriplePartsMask::GRAPH);
        }
        Ok(bound)
    }

    fn next_match(&mut self) {
        if self.cursor < self.quads.len() {
            self.cursor += 1;
        }
    }

    fn is_end(&self) -> bool {
        self.cursor >= self.quads.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sparrow_model::Literal;

    fn named(iri: &str) -> NamedNode {
        NamedNode::new_unchecked(iri)
    }

    fn sample() -> MemoryTriplesSource {
        MemoryTriplesSource::new(Dataset::from_iter([
            Quad::new(
                named("http://example.com/a"),
                named("http://example.com/p"),
                Literal::new_simple_literal("one"),
                GraphName::DefaultGraph,
            ),
            Quad::new(
                named("http://example.com/b"),
                named("http://example.com/p"),
                Literal::new_simple_literal("two"),
                named("http://example.com/g"),
            ),
        ]))
    }

    #[test]
    fn matching_is_scoped_to_the_default_graph() {
        let source = sample();
        let mut matched = source
            .init_triples_match(&TripleQuery {
                predicate: Some(named("http://example.com/p").into()),
                ..TripleQuery::default()
            })
            .unwrap();
        let mut bindings: [Option<Term>; 4] = [None, None, None, None];
        assert!(!matched.is_end());
        let bound = matched
            .bind_match(
                &mut bindings,
                TriplePartsMask::SUBJECT.with(TriplePartsMask::OBJECT),
            )
            .unwrap();
        assert!(bound.contains(TriplePartsMask::SUBJECT));
        assert_eq!(
            bindings[0],
            Some(named("http://example.com/a").into())
        );
        matched.next_match();
        assert!(matched.is_end());
    }

    #[test]
    fn named_graph_scoping_and_enumeration() {
        let source = sample();
        let graph = Term::from(named("http://example.com/g"));
        let matched = source
            .init_triples_match(&TripleQuery {
                graph: Some(graph.clone()),
                ..TripleQuery::default()
            })
            .unwrap();
        assert!(!matched.is_end());
        assert!(source.support_feature(SourceFeature::GraphEnumeration));
        assert_eq!(source.graph_names().unwrap(), vec![graph]);
    }

    #[test]
    fn exact_presence() {
        let source = sample();
        assert!(source
            .triple_present(
                &named("http://example.com/a").into(),
                &named("http://example.com/p").into(),
                &Literal::new_simple_literal("one").into(),
                None,
            )
            .unwrap());
        assert!(!source
            .triple_present(
                &named("http://example.com/a").into(),
                &named("http://example.com/p").into(),
                &Literal::new_simple_literal("two").into(),
                None,
            )
            .unwrap());
    }
}
