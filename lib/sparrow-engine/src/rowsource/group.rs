use crate::context::EvalContext;
use crate::error::EvaluationError;
use crate::expression::evaluate_expression;
use crate::row::Row;
use crate::rowsource::{BoxRowSource, RowSource};
use crate::value::{self, numeric_value, order_cmp, str_value, Numeric};
use rustc_hash::FxHashMap;
use sparrow_algebra::{AggregateExpression, AggregateFunction, Expression};
use sparrow_model::{Literal, Term};
use std::rc::Rc;

/// Grouping and aggregation: groups the child rows by the tuple of group
/// expressions and emits one row per group carrying the key bindings plus
/// one value per aggregate.
///
/// Aggregation is eager: every child row is consumed before the first
/// group is emitted. An aggregate whose input errors leaves its variable
/// unbound for that group.
pub(crate) struct GroupRowSource {
    context: Rc<EvalContext>,
    child: BoxRowSource,
    by: Vec<Expression>,
    aggregates: Vec<(usize, AggregateExpression)>,
    declared: Vec<usize>,
    groups: Option<Vec<Row>>,
    cursor: usize,
    failed: bool,
}

impl GroupRowSource {
    pub fn new(
        context: Rc<EvalContext>,
        child: BoxRowSource,
        by: Vec<Expression>,
        aggregates: Vec<(usize, AggregateExpression)>,
    ) -> Self {
        Self {
            context,
            child,
            by,
            aggregates,
            declared: Vec::new(),
            groups: None,
            cursor: 0,
            failed: false,
        }
    }

    fn materialise(&mut self) -> Result<(), EvaluationError> {
        let rows = self.child.read_all_rows()?;
        let mut order: Vec<Vec<Option<Term>>> = Vec::new();
        let mut members: FxHashMap<Vec<Option<Term>>, Vec<Row>> = FxHashMap::default();
        for row in rows {
            let key: Vec<Option<Term>> = self
                .by
                .iter()
                .map(|expression| {
                    evaluate_expression(expression, &row, &self.context).unwrap_or(None)
                })
                .collect();
            if !members.contains_key(&key) {
                order.push(key.clone());
            }
            members.entry(key).or_default().push(row);
        }
        // Aggregation over the empty input with no keys yields one group
        if order.is_empty() && self.by.is_empty() {
            order.push(Vec::new());
            members.insert(Vec::new(), Vec::new());
        }
        let mut groups = Vec::with_capacity(order.len());
        for (group_offset, key) in order.into_iter().enumerate() {
            let group_rows = members.remove(&key).unwrap_or_default();
            let mut out = Row::new();
            for (expression, value) in self.by.iter().zip(key) {
                if let (Expression::Variable(variable), Some(value)) = (expression, value) {
                    if let Some(offset) = self.context.variables.offset(variable.as_str()) {
                        out.set(offset, value);
                    }
                }
            }
            for (offset, aggregate) in &self.aggregates {
                if let Some(value) = self.evaluate_aggregate(aggregate, &group_rows) {
                    out.set(*offset, value);
                }
            }
            out.set_offset(group_offset as u64);
            groups.push(out);
        }
        self.groups = Some(groups);
        self.cursor = 0;
        Ok(())
    }

    /// One aggregate over one group; `None` means the aggregate errored and
    /// its variable stays unbound.
    fn evaluate_aggregate(
        &self,
        aggregate: &AggregateExpression,
        rows: &[Row],
    ) -> Option<Term> {
        let mut values: Vec<Term> = Vec::new();
        if let Some(expression) = &aggregate.expression {
            for row in rows {
                if let Ok(Some(value)) = evaluate_expression(expression, row, &self.context) {
                    values.push(value);
                }
            }
        }
        if aggregate.distinct {
            let mut seen = Vec::new();
            values.retain(|value| {
                if seen.contains(value) {
                    false
                } else {
                    seen.push(value.clone());
                    true
                }
            });
        }
        match aggregate.function {
            AggregateFunction::Count => {
                let count = if aggregate.expression.is_some() {
                    values.len()
                } else {
                    rows.len()
                };
                Some(Literal::from(i64::try_from(count).unwrap_or(i64::MAX)).into())
            }
            AggregateFunction::Sum => {
                let mut sum = Numeric::Integer(0.into());
                for value in &values {
                    let value = numeric_value(value).ok()??;
                    sum = value::numeric_add(sum, value).ok()?;
                }
                Some(sum.to_term())
            }
            AggregateFunction::Avg => {
                if values.is_empty() {
                    return Some(Literal::from(0i64).into());
                }
                let mut sum = Numeric::Integer(0.into());
                for value in &values {
                    let value = numeric_value(value).ok()??;
                    sum = value::numeric_add(sum, value).ok()?;
                }
                let count = Numeric::Integer(i64::try_from(values.len()).ok()?.into());
                value::numeric_div(sum, count).ok().map(Numeric::to_term)
            }
            AggregateFunction::Min => values
                .iter()
                .min_by(|a, b| order_cmp(Some(a), Some(b)))
                .cloned(),
            AggregateFunction::Max => values
                .iter()
                .max_by(|a, b| order_cmp(Some(a), Some(b)))
                .cloned(),
            AggregateFunction::Sample => values.first().cloned(),
            AggregateFunction::GroupConcat => {
                let separator = aggregate.separator.as_deref().unwrap_or(" ");
                let mut result = String::new();
                for (index, value) in values.iter().enumerate() {
                    if index > 0 {
                        result.push_str(separator);
                    }
                    result.push_str(&str_value(value).ok()?);
                }
                Some(Literal::new_simple_literal(result).into())
            }
        }
    }
}

impl RowSource for GroupRowSource {
    fn ensure_variables(&mut self) -> Result<(), EvaluationError> {
        self.child.ensure_variables()?;
        if self.declared.is_empty() {
            for expression in &self.by {
                if let Expression::Variable(variable) = expression {
                    let offset = self.context.variables.declare(variable);
                    if !self.declared.contains(&offset) {
                        self.declared.push(offset);
                    }
                }
            }
            for (offset, _) in &self.aggregates {
                if !self.declared.contains(offset) {
                    self.declared.push(*offset);
                }
            }
        }
        Ok(())
    }

    fn variables(&self) -> &[usize] {
        &self.declared
    }

    fn read_row(&mut self) -> Result<Option<Row>, EvaluationError> {
        if self.failed {
            return Ok(None);
        }
        if self.groups.is_none() {
            if let Err(e) = self.materialise() {
                self.failed = true;
                return Err(e);
            }
        }
        let Some(groups) = &self.groups else {
            return Ok(None);
        };
        match groups.get(self.cursor) {
            Some(row) => {
                self.cursor += 1;
                Ok(Some(row.clone()))
            }
            None => Ok(None),
        }
    }

    fn reset(&mut self) -> Result<(), EvaluationError> {
        self.cursor = 0;
        self.failed = false;
        Ok(())
    }

    fn inner_rowsource(&self, index: usize) -> Option<&dyn RowSource> {
        (index == 0).then(|| &*self.child)
    }

    fn finish(&mut self) {
        self.groups = None;
        self.child.finish();
    }
}
