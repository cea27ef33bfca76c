use crate::error::EvaluationError;
use crate::row::Row;
use crate::rowsource::RowSource;
use sparrow_model::NamedNode;
use tracing::warn;

/// The `SERVICE` stub: federated evaluation is out of scope, so a
/// non-silent service is an evaluation error and a silent one degrades to
/// the single empty solution the SPARQL federation spec prescribes.
pub(crate) struct ServiceRowSource {
    /// `None` when the endpoint was named by a variable.
    name: Option<NamedNode>,
    silent: bool,
    emitted: bool,
    failed: bool,
}

impl ServiceRowSource {
    pub fn new(name: Option<NamedNode>, silent: bool) -> Self {
        Self {
            name,
            silent,
            emitted: false,
            failed: false,
        }
    }
}

impl RowSource for ServiceRowSource {
    fn ensure_variables(&mut self) -> Result<(), EvaluationError> {
        Ok(())
    }

    fn variables(&self) -> &[usize] {
        &[]
    }

    fn read_row(&mut self) -> Result<Option<Row>, EvaluationError> {
        if self.failed || self.emitted {
            return Ok(None);
        }
        if self.silent {
            match &self.name {
                Some(name) => warn!("ignoring SERVICE {name} (SILENT, no handler)"),
                None => warn!("ignoring SERVICE with a variable endpoint (SILENT, no handler)"),
            }
            self.emitted = true;
            return Ok(Some(Row::new()));
        }
        self.failed = true;
        match self.name.clone() {
            Some(name) => Err(EvaluationError::UnsupportedService(name)),
            None => Err(EvaluationError::UnboundService),
        }
    }

    fn reset(&mut self) -> Result<(), EvaluationError> {
        self.emitted = false;
        self.failed = false;
        Ok(())
    }
}
