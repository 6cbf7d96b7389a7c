//! The consumption engine: plan, then deduct atomically through the store.
//!
//! ```text
//! recipe + Q + silo
//!   ↓ plan_for_recipe       (scale, source cement from the silo)
//!   ↓ DeductionSet          (summed per item)
//!   ↓ commit_consumption    (ordered item locks, check all, write all)
//!   ↓ notify                (after the locks are released)
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use plantops_core::{DomainError, ExpectedVersion, OperatorContext};
use plantops_inventory::{InventoryItem, StockTransaction, StorageLocation, StorageLocationId, cement_item_of};
use plantops_production::{
    ConsumptionPlan, NotificationDispatcher, ProductionRun, ProductionRunId, Recipe, RunDetails,
    SiloSource, plan_for_recipe,
};

use crate::store::{ConsumptionCommit, PlantStore, RunWrite, StoreError, StoreResult};

/// Output of a committed consumption.
#[derive(Debug, Clone)]
pub struct ConsumptionOutcome {
    pub run: ProductionRun,
    pub transactions: Vec<StockTransaction>,
}

#[derive(Debug, Clone)]
pub struct ConsumptionEngine<S, N> {
    store: S,
    notifier: N,
    approver: String,
}

impl<S, N> ConsumptionEngine<S, N>
where
    S: PlantStore,
    N: NotificationDispatcher,
{
    /// `approver` is stamped on every consumption transaction.
    pub fn new(store: S, notifier: N, approver: impl Into<String>) -> Self {
        Self {
            store,
            notifier,
            approver: approver.into(),
        }
    }

    pub fn approver(&self) -> &str {
        &self.approver
    }

    /// Scale `recipe` to `quantity` and resolve every ingredient's source.
    ///
    /// Reads current item state for bindings and unit costs only; nothing is
    /// locked and availability is not checked.
    pub fn plan(
        &self,
        ctx: &OperatorContext,
        recipe: &Recipe,
        quantity: Decimal,
        silo_id: Option<StorageLocationId>,
    ) -> StoreResult<ConsumptionPlan> {
        let items = self.store.list_items(ctx.tenant_id())?;
        let silo = match silo_id {
            Some(id) => Some(self.resolve_silo(ctx, id, &items)?),
            None => None,
        };
        let by_id: HashMap<_, _> = items.iter().map(|i| (i.id_typed(), i)).collect();

        let source = silo.as_ref().map(|(silo, cement)| SiloSource { silo, cement: *cement });
        Ok(plan_for_recipe(recipe, quantity, source, |id| by_id.get(id).copied())?)
    }

    fn resolve_silo<'a>(
        &self,
        ctx: &OperatorContext,
        id: StorageLocationId,
        items: &'a [InventoryItem],
    ) -> StoreResult<(StorageLocation, &'a InventoryItem)> {
        let silo = self
            .store
            .location(ctx.tenant_id(), id)?
            .ok_or_else(|| DomainError::not_found(format!("silo {id}")))?;
        let cement = cement_item_of(&silo, items)?;
        Ok((silo, cement))
    }

    /// Immediate production: plan, deduct and persist a `Completed` run in
    /// one unit of work.
    #[instrument(
        skip_all,
        fields(tenant = %ctx.tenant_id(), recipe = %recipe.id_typed(), quantity = %quantity),
        err
    )]
    pub fn run_immediate(
        &self,
        ctx: &OperatorContext,
        recipe: &Recipe,
        quantity: Decimal,
        silo_id: Option<StorageLocationId>,
        details: RunDetails,
    ) -> StoreResult<ConsumptionOutcome> {
        let plan = self.plan(ctx, recipe, quantity, silo_id)?;
        let at = Utc::now();
        let run = ProductionRun::immediate(
            ProductionRunId::generate(),
            ctx,
            recipe,
            &plan,
            silo_id,
            details,
            at,
        )?;

        let commit = ConsumptionCommit {
            deductions: plan.deductions()?,
            reason: consumption_reason(&run),
            approver: self.approver.clone(),
            write: RunWrite::Insert,
            run,
            at,
        };
        self.commit(ctx, commit)
    }

    /// Deduct a completed scheduled run's actual usage and persist it.
    ///
    /// `run` must already be in its completed state; `expected` is the
    /// version it was loaded at.
    #[instrument(
        skip_all,
        fields(tenant = %ctx.tenant_id(), run = %run.id_typed(), recipe = %run.recipe_id()),
        err
    )]
    pub fn commit_completion(
        &self,
        ctx: &OperatorContext,
        run: ProductionRun,
        expected: ExpectedVersion,
        at: DateTime<Utc>,
    ) -> StoreResult<ConsumptionOutcome> {
        let commit = ConsumptionCommit {
            deductions: run.consumption_deductions()?,
            reason: consumption_reason(&run),
            approver: self.approver.clone(),
            write: RunWrite::Update(expected),
            run,
            at,
        };
        self.commit(ctx, commit)
    }

    fn commit(&self, ctx: &OperatorContext, commit: ConsumptionCommit) -> StoreResult<ConsumptionOutcome> {
        let run = commit.run.clone();

        match self.store.commit_consumption(commit) {
            Ok(transactions) => {
                info!(
                    run = %run.id_typed(),
                    cement_used = %run.cement_used(),
                    deductions = transactions.len(),
                    "production consumption committed"
                );
                self.notifier.notify_production_completed(
                    ctx.tenant_id(),
                    run.id_typed(),
                    run.recipe_name(),
                    run.quantity(),
                    ctx.operator_name(),
                );
                Ok(ConsumptionOutcome { run, transactions })
            }
            Err(StoreError::Domain(DomainError::InsufficientStock(shortage))) => {
                warn!(
                    item = %shortage.item_name,
                    required = %shortage.required,
                    available = %shortage.available,
                    deficit = %shortage.deficit(),
                    "production aborted: insufficient stock"
                );
                self.notifier
                    .notify_material_shortage(ctx.tenant_id(), run.recipe_name(), &shortage);
                Err(DomainError::InsufficientStock(shortage).into())
            }
            Err(e) => Err(e),
        }
    }
}

fn consumption_reason(run: &ProductionRun) -> String {
    format!(
        "Production of {} x {} ({})",
        run.recipe_name(),
        run.quantity(),
        run.product_code()
    )
}
