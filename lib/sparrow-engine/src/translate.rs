//! The algebra → rowsource translator: a recursive descent over the
//! prepared tree, composing one operator per node.
//!
//! Failure at any node propagates with `?`, dropping the partially built
//! children on the way out.

use crate::context::EvalContext;
use crate::error::EvaluationError;
use crate::row::Row;
use crate::rowsource::{
    BoxRowSource, DistinctRowSource, ExtendRowSource, FilterRowSource, GraphOrigin,
    GraphRowSource, GroupRowSource, JoinRowSource, LeftJoinRowSource, MinusRowSource,
    ProjectRowSource, ReducedRowSource, RowSequenceRowSource, ServiceRowSource, SliceRowSource,
    SortRowSource, TriplesRowSource, UnionRowSource,
};
use sparrow_algebra::{GraphPattern, NamedNodePattern};
use std::rc::Rc;
use tracing::debug;

pub(crate) fn build_rowsource(
    pattern: &GraphPattern,
    context: &Rc<EvalContext>,
) -> Result<BoxRowSource, EvaluationError> {
    let mut rowsource = translate(pattern, context)?;
    rowsource.ensure_variables()?;
    Ok(rowsource)
}

fn translate(
    pattern: &GraphPattern,
    context: &Rc<EvalContext>,
) -> Result<BoxRowSource, EvaluationError> {
    Ok(match pattern {
        GraphPattern::Bgp { patterns } => Box::new(TriplesRowSource::new(
            Rc::clone(context),
            patterns.clone(),
        )),
        GraphPattern::Filter { expression, inner } => Box::new(FilterRowSource::new(
            Rc::clone(context),
            build_rowsource(inner, context)?,
            expression.clone(),
        )),
        GraphPattern::Join { left, right } => Box::new(JoinRowSource::new(
            build_rowsource(left, context)?,
            build_rowsource(right, context)?,
        )),
        GraphPattern::LeftJoin {
            left,
            right,
            expression,
        } => Box::new(LeftJoinRowSource::new(
            Rc::clone(context),
            build_rowsource(left, context)?,
            build_rowsource(right, context)?,
            expression.clone(),
        )),
        GraphPattern::Union { left, right } => Box::new(UnionRowSource::new(
            build_rowsource(left, context)?,
            build_rowsource(right, context)?,
        )),
        GraphPattern::Minus { left, right } => Box::new(MinusRowSource::new(
            build_rowsource(left, context)?,
            build_rowsource(right, context)?,
        )),
        GraphPattern::Graph { name, inner } => {
            let origin = match name {
                NamedNodePattern::NamedNode(node) => {
                    GraphOrigin::Constant(node.clone().into())
                }
                NamedNodePattern::Variable(variable) => {
                    GraphOrigin::Variable(context.variables.declare(variable))
                }
            };
            Box::new(GraphRowSource::new(
                Rc::clone(context),
                build_rowsource(inner, context)?,
                origin,
            ))
        }
        GraphPattern::Extend {
            inner,
            variable,
            expression,
        } => {
            let offset = context.variables.declare(variable);
            Box::new(ExtendRowSource::new(
                Rc::clone(context),
                build_rowsource(inner, context)?,
                offset,
                expression.clone(),
            ))
        }
        GraphPattern::Project { inner, variables } => {
            let child = build_rowsource(inner, context)?;
            let projection = variables
                .iter()
                .map(|variable| context.variables.declare(variable))
                .collect();
            Box::new(ProjectRowSource::new(child, projection))
        }
        GraphPattern::Distinct { inner } => {
            Box::new(DistinctRowSource::new(build_rowsource(inner, context)?))
        }
        GraphPattern::Reduced { inner } => {
            Box::new(ReducedRowSource::new(build_rowsource(inner, context)?))
        }
        GraphPattern::OrderBy { inner, conditions } => Box::new(SortRowSource::new(
            Rc::clone(context),
            build_rowsource(inner, context)?,
            conditions.clone(),
        )),
        GraphPattern::Slice {
            inner,
            offset,
            limit,
        } => Box::new(SliceRowSource::new(
            build_rowsource(inner, context)?,
            *offset,
            *limit,
        )),
        GraphPattern::Values {
            variables,
            bindings,
        } => {
            let offsets: Vec<usize> = variables
                .iter()
                .map(|variable| context.variables.declare(variable))
                .collect();
            let rows = bindings
                .iter()
                .map(|binding| {
                    if binding.len() != offsets.len() {
                        return Err(EvaluationError::MalformedAlgebra(format!(
                            "VALUES row of width {} under {} variables",
                            binding.len(),
                            offsets.len()
                        )));
                    }
                    let mut row = Row::new();
                    for (offset, value) in offsets.iter().zip(binding) {
                        if let Some(value) = value {
                            row.set(*offset, value.clone());
                        }
                    }
                    Ok(row)
                })
                .collect::<Result<Vec<_>, _>>()?;
            Box::new(RowSequenceRowSource::new(offsets, rows))
        }
        GraphPattern::Group {
            inner,
            by,
            aggregates,
        } => {
            let aggregates = aggregates
                .iter()
                .map(|(variable, aggregate)| {
                    (context.variables.declare(variable), aggregate.clone())
                })
                .collect();
            Box::new(GroupRowSource::new(
                Rc::clone(context),
                build_rowsource(inner, context)?,
                by.clone(),
                aggregates,
            ))
        }
        // A stable sort with no conditions materialises the child while
        // keeping its order
        GraphPattern::ToList { inner } => Box::new(SortRowSource::new(
            Rc::clone(context),
            build_rowsource(inner, context)?,
            Vec::new(),
        )),
        GraphPattern::Service {
            name,
            inner,
            silent,
        } => {
            debug!("translating SERVICE {name} as a stub");
            // The inner pattern still declares its variables so projections
            // over them stay well-formed
            build_rowsource(inner, context)?;
            match name {
                NamedNodePattern::NamedNode(node) => {
                    Box::new(ServiceRowSource::new(Some(node.clone()), *silent))
                }
                NamedNodePattern::Variable(_) => {
                    if *silent {
                        Box::new(ServiceRowSource::new(None, *silent))
                    } else {
                        return Err(EvaluationError::UnboundService);
                    }
                }
            }
        }
    })
}
