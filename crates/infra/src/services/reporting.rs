use tracing::{debug, instrument};

use plantops_core::OperatorContext;
use plantops_production::{DateRange, VarianceReport};

use crate::store::{PlantStore, StoreResult};

/// Read-only planned-vs-actual reporting.
#[derive(Debug, Clone)]
pub struct VarianceReporter<S> {
    store: S,
}

impl<S: PlantStore> VarianceReporter<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[instrument(skip_all, fields(tenant = %ctx.tenant_id(), from = %range.from, to = %range.to), err)]
    pub fn variance_report(&self, ctx: &OperatorContext, range: DateRange) -> StoreResult<VarianceReport> {
        let runs = self.store.list_runs(ctx.tenant_id())?;
        let report = VarianceReport::build(&runs, range)?;
        debug!(
            runs = report.total_runs,
            with_variance = report.runs_with_variance,
            "variance report built"
        );
        Ok(report)
    }
}
