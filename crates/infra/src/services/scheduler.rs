use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{info, instrument};

use plantops_core::{DomainError, ExpectedVersion, OperatorContext, Versioned};
use plantops_inventory::StorageLocationId;
use plantops_production::{
    NotificationDispatcher, ProductionRun, ProductionRunId, RecipeId, RunDetails, RunStatus,
};

use crate::services::engine::{ConsumptionEngine, ConsumptionOutcome};
use crate::store::{PlantStore, StoreResult};

/// Input for an immediate run.
#[derive(Debug, Clone)]
pub struct ImmediateRun {
    pub recipe_id: RecipeId,
    pub quantity: Decimal,
    pub silo_id: Option<StorageLocationId>,
    pub details: RunDetails,
}

/// Input for a planned run.
#[derive(Debug, Clone)]
pub struct ScheduleRun {
    pub recipe_id: RecipeId,
    pub planned_quantity: Decimal,
    pub silo_id: StorageLocationId,
    pub scheduled_date: DateTime<Utc>,
    pub details: RunDetails,
}

/// Input for completing a started run.
#[derive(Debug, Clone, Default)]
pub struct CompleteRun {
    pub actual_quantity: Decimal,
    /// Actual usage keyed by material label.
    pub actual_usage: BTreeMap<String, Decimal>,
}

/// Drives production runs through their lifecycle.
///
/// Metadata transitions are optimistic writes; completion goes through the
/// engine's locked unit of work.
#[derive(Debug, Clone)]
pub struct ProductionScheduler<S, N> {
    store: S,
    engine: ConsumptionEngine<S, N>,
}

impl<S, N> ProductionScheduler<S, N>
where
    S: PlantStore + Clone,
    N: NotificationDispatcher,
{
    pub fn new(store: S, notifier: N, approver: impl Into<String>) -> Self {
        Self {
            engine: ConsumptionEngine::new(store.clone(), notifier, approver),
            store,
        }
    }

    pub fn engine(&self) -> &ConsumptionEngine<S, N> {
        &self.engine
    }

    pub fn run_immediate(&self, ctx: &OperatorContext, input: ImmediateRun) -> StoreResult<ConsumptionOutcome> {
        let recipe = self.recipe(ctx, input.recipe_id)?;
        self.engine
            .run_immediate(ctx, &recipe, input.quantity, input.silo_id, input.details)
    }

    #[instrument(
        skip_all,
        fields(tenant = %ctx.tenant_id(), recipe = %input.recipe_id, planned = %input.planned_quantity),
        err
    )]
    pub fn schedule_run(&self, ctx: &OperatorContext, input: ScheduleRun) -> StoreResult<ProductionRun> {
        let recipe = self.recipe(ctx, input.recipe_id)?;
        let plan = self
            .engine
            .plan(ctx, &recipe, input.planned_quantity, Some(input.silo_id))?;

        let run = ProductionRun::schedule(
            ProductionRunId::generate(),
            ctx,
            &recipe,
            &plan,
            input.silo_id,
            input.scheduled_date,
            input.details,
            Utc::now(),
        )?;
        self.store.insert_run(run.clone())?;

        info!(run = %run.id_typed(), date = %input.scheduled_date, "production run scheduled");
        Ok(run)
    }

    #[instrument(skip_all, fields(tenant = %ctx.tenant_id(), run = %run_id), err)]
    pub fn reschedule_run(
        &self,
        ctx: &OperatorContext,
        run_id: ProductionRunId,
        new_date: DateTime<Utc>,
        reason: Option<String>,
    ) -> StoreResult<ProductionRun> {
        self.transition(ctx, run_id, |run| run.reschedule(new_date, reason, Utc::now()))
    }

    #[instrument(skip_all, fields(tenant = %ctx.tenant_id(), run = %run_id), err)]
    pub fn delay_run(&self, ctx: &OperatorContext, run_id: ProductionRunId, reason: &str) -> StoreResult<ProductionRun> {
        self.transition(ctx, run_id, |run| run.delay(reason))
    }

    #[instrument(skip_all, fields(tenant = %ctx.tenant_id(), run = %run_id), err)]
    pub fn start_run(&self, ctx: &OperatorContext, run_id: ProductionRunId) -> StoreResult<ProductionRun> {
        self.transition(ctx, run_id, |run| run.start(Utc::now()))
    }

    /// Record actuals and deduct them, all in one unit of work.
    #[instrument(skip_all, fields(tenant = %ctx.tenant_id(), run = %run_id), err)]
    pub fn complete_run(
        &self,
        ctx: &OperatorContext,
        run_id: ProductionRunId,
        input: CompleteRun,
    ) -> StoreResult<ConsumptionOutcome> {
        let mut run = self.get_run(ctx, run_id)?;
        let expected = ExpectedVersion::Exact(run.version());
        let at = Utc::now();

        run.complete(input.actual_quantity, &input.actual_usage, at)?;
        self.engine.commit_completion(ctx, run, expected, at)
    }

    pub fn get_run(&self, ctx: &OperatorContext, run_id: ProductionRunId) -> StoreResult<ProductionRun> {
        self.store
            .run(ctx.tenant_id(), run_id)?
            .ok_or_else(|| DomainError::not_found(format!("production run {run_id}")).into())
    }

    pub fn list_runs(&self, ctx: &OperatorContext, status: Option<RunStatus>) -> StoreResult<Vec<ProductionRun>> {
        let mut runs = self.store.list_runs(ctx.tenant_id())?;
        if let Some(status) = status {
            runs.retain(|r| r.status() == status);
        }
        Ok(runs)
    }

    fn recipe(&self, ctx: &OperatorContext, id: RecipeId) -> StoreResult<plantops_production::Recipe> {
        self.store
            .recipe(ctx.tenant_id(), id)?
            .ok_or_else(|| DomainError::not_found(format!("recipe {id}")).into())
    }

    /// Load, apply `change`, write back guarded by the loaded version.
    fn transition<F>(&self, ctx: &OperatorContext, run_id: ProductionRunId, change: F) -> StoreResult<ProductionRun>
    where
        F: FnOnce(&mut ProductionRun) -> plantops_core::DomainResult<()>,
    {
        let mut run = self.get_run(ctx, run_id)?;
        let expected = ExpectedVersion::Exact(run.version());

        change(&mut run)?;
        self.store.update_run(run.clone(), expected)?;

        info!(status = %run.status(), "production run updated");
        Ok(run)
    }
}
