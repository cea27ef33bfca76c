use crate::algebra::GraphPattern;
use crate::term::TriplePattern;
use std::fmt;

/// A prepared [SPARQL query](https://www.w3.org/TR/sparql11-query/): one of the
/// four query forms wrapping an algebra tree.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum Query {
    /// [SELECT](https://www.w3.org/TR/sparql11-query/#select): produces solution rows.
    Select {
        pattern: GraphPattern,
        base_iri: Option<String>,
    },
    /// [ASK](https://www.w3.org/TR/sparql11-query/#ask): produces a boolean.
    Ask {
        pattern: GraphPattern,
        base_iri: Option<String>,
    },
    /// [CONSTRUCT](https://www.w3.org/TR/sparql11-query/#construct): instantiates a
    /// triple template for every solution row.
    Construct {
        template: Vec<TriplePattern>,
        pattern: GraphPattern,
        base_iri: Option<String>,
    },
    /// [DESCRIBE](https://www.w3.org/TR/sparql11-query/#describe): produces the
    /// triples about the matched resources.
    Describe {
        pattern: GraphPattern,
        base_iri: Option<String>,
    },
}

impl Query {
    /// The algebra tree of this query.
    #[inline]
    pub fn pattern(&self) -> &GraphPattern {
        match self {
            Self::Select { pattern, .. }
            | Self::Ask { pattern, .. }
            | Self::Construct { pattern, .. }
            | Self::Describe { pattern, .. } => pattern,
        }
    }

    #[inline]
    pub fn base_iri(&self) -> Option<&str> {
        match self {
            Self::Select { base_iri, .. }
            | Self::Ask { base_iri, .. }
            | Self::Construct { base_iri, .. }
            | Self::Describe { base_iri, .. } => base_iri.as_deref(),
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select { pattern, .. } => write!(f, "(select {pattern})"),
            Self::Ask { pattern, .. } => write!(f, "(ask {pattern})"),
            Self::Construct {
                template, pattern, ..
            } => {
                f.write_str("(construct (")?;
                for (i, triple) in template.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "({triple})")?;
                }
                write!(f, ") {pattern})")
            }
            Self::Describe { pattern, .. } => write!(f, "(describe {pattern})"),
        }
    }
}
