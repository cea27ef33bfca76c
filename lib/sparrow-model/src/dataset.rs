use crate::named_node::NamedNode;
use crate::term::{GraphName, NamedOrBlankNode, Quad, Term, Triple};
use std::collections::HashSet;
use std::fmt;

/// An in-memory [RDF dataset](https://www.w3.org/TR/rdf11-concepts/#dfn-rdf-dataset).
///
/// It keeps the quads in insertion order and answers pattern queries by
/// scanning, which is plenty for the fixture-sized graphs the engine tests
/// and small hosts use. Bigger stores plug into the engine through its
/// triples-source interface instead.
///
/// ```
/// use sparrow_model::{Dataset, GraphName, NamedNode, Quad};
///
/// let ex = NamedNode::new("http://example.com")?;
/// let mut dataset = Dataset::new();
/// dataset.insert(Quad::new(
///     ex.clone(),
///     ex.clone(),
///     ex.clone(),
///     GraphName::DefaultGraph,
/// ));
/// assert_eq!(
///     dataset
///         .quads_for_pattern(None, Some(&ex), None, None)
///         .count(),
///     1
/// );
/// # Result::<_, sparrow_model::IriParseError>::Ok(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    quads: Vec<Quad>,
    index: HashSet<Quad>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.quads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }

    /// Adds a quad, returning `true` when it was not already present.
    pub fn insert(&mut self, quad: Quad) -> bool {
        if self.index.insert(quad.clone()) {
            self.quads.push(quad);
            true
        } else {
            false
        }
    }

    /// Adds a triple to the default graph.
    pub fn insert_triple(&mut self, triple: Triple) -> bool {
        self.insert(triple.in_graph(GraphName::DefaultGraph))
    }

    pub fn contains(&self, quad: &Quad) -> bool {
        self.index.contains(quad)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Quad> {
        self.quads.iter()
    }

    /// Iterates over the quads matching the given pattern, `None` standing for a wildcard.
    pub fn quads_for_pattern<'a>(
        &'a self,
        subject: Option<&'a NamedOrBlankNode>,
        predicate: Option<&'a NamedNode>,
        object: Option<&'a Term>,
        graph_name: Option<&'a GraphName>,
    ) -> impl Iterator<Item = &'a Quad> {
        self.quads.iter().filter(move |quad| {
            subject.is_none_or(|subject| quad.subject == *subject)
                && predicate.is_none_or(|predicate| quad.predicate == *predicate)
                && object.is_none_or(|object| quad.object == *object)
                && graph_name.is_none_or(|graph_name| quad.graph_name == *graph_name)
        })
    }

    /// The distinct named graphs present in this dataset, in first-seen order.
    pub fn graph_names(&self) -> Vec<GraphName> {
        let mut seen = HashSet::new();
        let mut names = Vec::new();
        for quad in &self.quads {
            if !quad.graph_name.is_default_graph() && seen.insert(&quad.graph_name) {
                names.push(quad.graph_name.clone());
            }
        }
        names
    }
}

impl FromIterator<Quad> for Dataset {
    fn from_iter<I: IntoIterator<Item = Quad>>(iter: I) -> Self {
        let mut dataset = Self::new();
        for quad in iter {
            dataset.insert(quad);
        }
        dataset
    }
}

impl FromIterator<Triple> for Dataset {
    fn from_iter<I: IntoIterator<Item = Triple>>(iter: I) -> Self {
        let mut dataset = Self::new();
        for triple in iter {
            dataset.insert_triple(triple);
        }
        dataset
    }
}

impl Extend<Quad> for Dataset {
    fn extend<I: IntoIterator<Item = Quad>>(&mut self, iter: I) {
        for quad in iter {
            self.insert(quad);
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for quad in &self.quads {
            writeln!(f, "{quad} .")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(iri: &str) -> NamedNode {
        NamedNode::new_unchecked(iri)
    }

    #[test]
    fn insert_is_idempotent() {
        let mut dataset = Dataset::new();
        let quad = Quad::new(
            named("http://example.com/s"),
            named("http://example.com/p"),
            named("http://example.com/o"),
            GraphName::DefaultGraph,
        );
        assert!(dataset.insert(quad.clone()));
        assert!(!dataset.insert(quad));
        assert_eq!(dataset.len(), 1);
    }

    #[test]
    fn pattern_matching_filters_on_every_position() {
        let s = named("http://example.com/s");
        let p = named("http://example.com/p");
        let g = named("http://example.com/g");
        let mut dataset = Dataset::new();
        dataset.insert(Quad::new(
            s.clone(),
            p.clone(),
            named("http://example.com/o1"),
            GraphName::DefaultGraph,
        ));
        dataset.insert(Quad::new(
            s.clone(),
            p.clone(),
            named("http://example.com/o2"),
            g.clone(),
        ));
        let subject = NamedOrBlankNode::from(s);
        assert_eq!(
            dataset
                .quads_for_pattern(Some(&subject), None, None, None)
                .count(),
            2
        );
        assert_eq!(
            dataset
                .quads_for_pattern(None, None, None, Some(&GraphName::from(g)))
                .count(),
            1
        );
        assert_eq!(dataset.graph_names().len(), 1);
    }
}
