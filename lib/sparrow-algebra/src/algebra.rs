//! The relational-style [query algebra](https://www.w3.org/TR/sparql11-query/#sparqlQuery)
//! the execution core consumes.

use crate::expression::{AggregateExpression, Expression, OrderExpression};
use crate::term::{NamedNodePattern, TriplePattern};
use sparrow_model::{Term, Variable};
use std::fmt;

/// A node of the prepared algebra tree.
///
/// Each variant corresponds to one rowsource operator of the engine; the
/// documentation of the exact operator semantics lives with the engine.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum GraphPattern {
    /// A [basic graph pattern](https://www.w3.org/TR/sparql11-query/#defn_BasicGraphPattern):
    /// conjoined triple patterns.
    Bgp { patterns: Vec<TriplePattern> },
    /// [Filter](https://www.w3.org/TR/sparql11-query/#defn_algFilter): keeps the
    /// rows for which the expression evaluates to true.
    Filter {
        expression: Expression,
        inner: Box<Self>,
    },
    /// [Join](https://www.w3.org/TR/sparql11-query/#defn_algJoin) on shared-variable compatibility.
    Join { left: Box<Self>, right: Box<Self> },
    /// [LeftJoin](https://www.w3.org/TR/sparql11-query/#defn_algLeftJoin): `OPTIONAL`
    /// with an optional attached filter.
    LeftJoin {
        left: Box<Self>,
        right: Box<Self>,
        expression: Option<Expression>,
    },
    /// [Union](https://www.w3.org/TR/sparql11-query/#defn_algUnion): left rows then right rows.
    Union { left: Box<Self>, right: Box<Self> },
    /// [Minus](https://www.w3.org/TR/sparql11-query/#defn_algMinus): removes left rows
    /// matched by a right row sharing at least one bound variable.
    Minus { left: Box<Self>, right: Box<Self> },
    /// Evaluates the inner pattern against the graph named by `name`.
    Graph {
        name: NamedNodePattern,
        inner: Box<Self>,
    },
    /// [Extend](https://www.w3.org/TR/sparql11-query/#defn_extend): binds one new
    /// variable to the value of an expression.
    Extend {
        inner: Box<Self>,
        variable: Variable,
        expression: Expression,
    },
    /// [Projection](https://www.w3.org/TR/sparql11-query/#defn_algProjection) onto a variable sequence.
    Project {
        inner: Box<Self>,
        variables: Vec<Variable>,
    },
    /// [Distinct](https://www.w3.org/TR/sparql11-query/#defn_algDistinct): full duplicate elimination.
    Distinct { inner: Box<Self> },
    /// [Reduced](https://www.w3.org/TR/sparql11-query/#defn_algReduced): adjacent duplicate suppression.
    Reduced { inner: Box<Self> },
    /// [OrderBy](https://www.w3.org/TR/sparql11-query/#defn_algOrdered): stable sort
    /// by a list of conditions.
    OrderBy {
        inner: Box<Self>,
        conditions: Vec<OrderExpression>,
    },
    /// [Slice](https://www.w3.org/TR/sparql11-query/#defn_algSlice): `OFFSET`/`LIMIT`.
    Slice {
        inner: Box<Self>,
        offset: usize,
        limit: Option<usize>,
    },
    /// [VALUES](https://www.w3.org/TR/sparql11-query/#inline-data): inline materialised rows.
    Values {
        variables: Vec<Variable>,
        bindings: Vec<Vec<Option<Term>>>,
    },
    /// [Group](https://www.w3.org/TR/sparql11-query/#defn_algGroup): grouping keys
    /// plus aggregates bound to fresh variables.
    Group {
        inner: Box<Self>,
        by: Vec<Expression>,
        aggregates: Vec<(Variable, AggregateExpression)>,
    },
    /// Materialises the inner pattern into a row sequence.
    ToList { inner: Box<Self> },
    /// [SERVICE](https://www.w3.org/TR/sparql11-federated-query/): remote evaluation,
    /// delegated to a host-registered handler.
    Service {
        name: NamedNodePattern,
        inner: Box<Self>,
        silent: bool,
    },
}

impl GraphPattern {
    /// Walks the tree in prefix order, calling `callback` on every node.
    pub fn visit<'a>(&'a self, callback: &mut impl FnMut(&'a Self)) {
        callback(self);
        match self {
            Self::Bgp { .. } | Self::Values { .. } => {}
            Self::Filter { inner, .. }
            | Self::Graph { inner, .. }
            | Self::Extend { inner, .. }
            | Self::Project { inner, .. }
            | Self::Distinct { inner }
            | Self::Reduced { inner }
            | Self::OrderBy { inner, .. }
            | Self::Slice { inner, .. }
            | Self::Group { inner, .. }
            | Self::ToList { inner }
            | Self::Service { inner, .. } => inner.visit(callback),
            Self::Join { left, right }
            | Self::LeftJoin { left, right, .. }
            | Self::Union { left, right }
            | Self::Minus { left, right } => {
                left.visit(callback);
                right.visit(callback);
            }
        }
    }

    /// The number of algebra nodes in this tree, used by schedulers and tests
    /// to assert tree shape.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.visit(&mut |_| count += 1);
        count
    }

    /// The variables this pattern may bind, in declaration order, without duplicates.
    pub fn in_scope_variables(&self) -> Vec<Variable> {
        let mut variables = Vec::new();
        self.collect_in_scope_variables(&mut variables);
        variables
    }

    fn collect_in_scope_variables(&self, variables: &mut Vec<Variable>) {
        let mut add = |v: &Variable| {
            if !variables.contains(v) {
                variables.push(v.clone());
            }
        };
        match self {
            Self::Bgp { patterns } => {
                for pattern in patterns {
                    pattern.variables().for_each(&mut add);
                }
            }
            Self::Values {
                variables: declared,
                ..
            } => declared.iter().for_each(&mut add),
            Self::Project {
                variables: declared,
                ..
            } => declared.iter().for_each(&mut add),
            Self::Graph { name, inner } => {
                if let NamedNodePattern::Variable(variable) = name {
                    add(variable);
                }
                inner.collect_in_scope_variables(variables);
            }
            Self::Extend {
                inner, variable, ..
            } => {
                inner.collect_in_scope_variables(variables);
                if !variables.contains(variable) {
                    variables.push(variable.clone());
                }
            }
            Self::Group { by, aggregates, .. } => {
                for expression in by {
                    if let Expression::Variable(variable) = expression {
                        add(variable);
                    }
                }
                for (variable, _) in aggregates {
                    if !variables.contains(variable) {
                        variables.push(variable.clone());
                    }
                }
            }
            Self::Filter { inner, .. }
            | Self::Distinct { inner }
            | Self::Reduced { inner }
            | Self::OrderBy { inner, .. }
            | Self::Slice { inner, .. }
            | Self::ToList { inner } => inner.collect_in_scope_variables(variables),
            Self::Service { name, inner, .. } => {
                if let NamedNodePattern::Variable(variable) = name {
                    add(variable);
                }
                inner.collect_in_scope_variables(variables);
            }
            Self::Join { left, right }
            | Self::LeftJoin { left, right, .. }
            | Self::Union { left, right }
            | Self::Minus { left, right } => {
                left.collect_in_scope_variables(variables);
                // Minus right-side variables are not visible downstream
                if !matches!(self, Self::Minus { .. }) {
                    right.collect_in_scope_variables(variables);
                }
            }
        }
    }
}

impl fmt::Display for GraphPattern {
    /// Formats using an S-expression syntax close to the
    /// [SPARQL algebra notation](https://jena.apache.org/documentation/notes/sse.html).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bgp { patterns } => {
                f.write_str("(bgp")?;
                for pattern in patterns {
                    write!(f, " ({pattern})")?;
                }
                f.write_str(")")
            }
            Self::Filter { expression, inner } => write!(f, "(filter {expression} {inner})"),
            Self::Join { left, right } => write!(f, "(join {left} {right})"),
            Self::LeftJoin {
                left,
                right,
                expression,
            } => match expression {
                Some(expression) => write!(f, "(leftjoin {left} {right} {expression})"),
                None => write!(f, "(leftjoin {left} {right})"),
            },
            Self::Union { left, right } => write!(f, "(union {left} {right})"),
            Self::Minus { left, right } => write!(f, "(minus {left} {right})"),
            Self::Graph { name, inner } => write!(f, "(graph {name} {inner})"),
            Self::Extend {
                inner,
                variable,
                expression,
            } => write!(f, "(extend ({variable} {expression}) {inner})"),
            Self::Project { inner, variables } => {
                f.write_str("(project (")?;
                for (i, variable) in variables.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    variable.fmt(f)?;
                }
                write!(f, ") {inner})")
            }
            Self::Distinct { inner } => write!(f, "(distinct {inner})"),
            Self::Reduced { inner } => write!(f, "(reduced {inner})"),
            Self::OrderBy { inner, conditions } => {
                f.write_str("(order (")?;
                for (i, condition) in conditions.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    condition.fmt(f)?;
                }
                write!(f, ") {inner})")
            }
            Self::Slice {
                inner,
                offset,
                limit,
            } => match limit {
                Some(limit) => write!(f, "(slice {offset} {limit} {inner})"),
                None => write!(f, "(slice {offset} _ {inner})"),
            },
            Self::Values {
                variables,
                bindings,
            } => {
                f.write_str("(table (vars")?;
                for variable in variables {
                    write!(f, " {variable}")?;
                }
                f.write_str(")")?;
                for row in bindings {
                    f.write_str(" (row")?;
                    for (variable, value) in variables.iter().zip(row) {
                        if let Some(value) = value {
                            write!(f, " ({variable} {value})")?;
                        }
                    }
                    f.write_str(")")?;
                }
                f.write_str(")")
            }
            Self::Group {
                inner,
                by,
                aggregates,
            } => {
                f.write_str("(group (")?;
                for (i, expression) in by.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    expression.fmt(f)?;
                }
                f.write_str(") (")?;
                for (i, (variable, aggregate)) in aggregates.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "({variable} {aggregate})")?;
                }
                write!(f, ") {inner})")
            }
            Self::ToList { inner } => write!(f, "(tolist {inner})"),
            Self::Service {
                name,
                inner,
                silent,
            } => {
                if *silent {
                    write!(f, "(service silent {name} {inner})")
                } else {
                    write!(f, "(service {name} {inner})")
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sparrow_model::NamedNode;

    fn bgp() -> GraphPattern {
        GraphPattern::Bgp {
            patterns: vec![TriplePattern::new(
                Variable::new_unchecked("s"),
                NamedNode::new_unchecked("http://example.com/p"),
                Variable::new_unchecked("o"),
            )],
        }
    }

    #[test]
    fn node_count_walks_the_whole_tree() {
        let pattern = GraphPattern::Project {
            inner: Box::new(GraphPattern::Join {
                left: Box::new(bgp()),
                right: Box::new(bgp()),
            }),
            variables: vec![Variable::new_unchecked("s")],
        };
        assert_eq!(pattern.node_count(), 4);
    }

    #[test]
    fn in_scope_variables_are_deduplicated_in_order() {
        let pattern = GraphPattern::Join {
            left: Box::new(bgp()),
            right: Box::new(bgp()),
        };
        assert_eq!(
            pattern.in_scope_variables(),
            vec![Variable::new_unchecked("s"), Variable::new_unchecked("o")]
        );
    }

    #[test]
    fn minus_right_variables_are_not_in_scope() {
        let pattern = GraphPattern::Minus {
            left: Box::new(bgp()),
            right: Box::new(GraphPattern::Bgp {
                patterns: vec![TriplePattern::new(
                    Variable::new_unchecked("s"),
                    NamedNode::new_unchecked("http://example.com/q"),
                    Variable::new_unchecked("hidden"),
                )],
            }),
        };
        assert_eq!(
            pattern.in_scope_variables(),
            vec![Variable::new_unchecked("s"), Variable::new_unchecked("o")]
        );
    }
}
