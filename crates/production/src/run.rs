use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use plantops_core::quantity::{checked_sum, ensure_non_negative, ensure_positive, ensure_present};
use plantops_core::{DomainError, DomainResult, Entity, OperatorContext, TenantId, UserId, Versioned};
use plantops_inventory::{DeductionSet, InventoryItemId, StorageLocationId};

use crate::consumption::ConsumptionPlan;
use crate::recipe::{IngredientRole, Recipe, RecipeId};

plantops_core::entity_id!(ProductionRunId, "ProductionRunId");

/// Production run lifecycle.
///
/// ```text
/// reschedule  Scheduled | Delayed        ──▶ Rescheduled
/// delay       Scheduled | Rescheduled    ──▶ Delayed
/// start       Scheduled | Rescheduled    ──▶ InProgress
/// complete    InProgress                 ──▶ Completed
/// ```
///
/// A rescheduled run must be delayed before it can be moved again.
///
/// Immediate runs are born `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Scheduled,
    Rescheduled,
    Delayed,
    InProgress,
    Completed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Scheduled => "scheduled",
            RunStatus::Rescheduled => "rescheduled",
            RunStatus::Delayed => "delayed",
            RunStatus::InProgress => "in_progress",
            RunStatus::Completed => "completed",
        }
    }
}

impl core::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for RunStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "scheduled" => Ok(RunStatus::Scheduled),
            "rescheduled" => Ok(RunStatus::Rescheduled),
            "delayed" => Ok(RunStatus::Delayed),
            "in_progress" | "inprogress" => Ok(RunStatus::InProgress),
            "completed" => Ok(RunStatus::Completed),
            other => Err(DomainError::validation(format!("unknown run status '{other}'"))),
        }
    }
}

/// Whether an actual quantity was entered by the operator or filled in from
/// the plan at completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActualSource {
    Recorded,
    Defaulted,
}

/// Planned vs. actual consumption of one ingredient in one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialUsage {
    pub material: String,
    pub role: IngredientRole,
    pub item_id: Option<InventoryItemId>,
    pub unit: String,
    pub planned_quantity: Decimal,
    pub actual_quantity: Option<Decimal>,
    pub variance: Option<Decimal>,
    /// Item unit cost captured when the run was planned.
    pub unit_cost: Option<Decimal>,
    pub actual_source: Option<ActualSource>,
}

impl MaterialUsage {
    fn planned(plan: &ConsumptionPlan) -> Vec<Self> {
        plan.requirements
            .iter()
            .map(|r| MaterialUsage {
                material: r.material.clone(),
                role: r.role,
                item_id: r.item_id,
                unit: r.unit.clone(),
                planned_quantity: r.required,
                actual_quantity: None,
                variance: None,
                unit_cost: r.unit_cost,
                actual_source: None,
            })
            .collect()
    }

    fn record_actual(&mut self, actual: Decimal, source: ActualSource) {
        self.actual_quantity = Some(actual);
        self.variance = Some(actual - self.planned_quantity);
        self.actual_source = Some(source);
    }
}

/// One entry of a run's reschedule history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RescheduleEntry {
    pub previous_date: Option<DateTime<Utc>>,
    pub new_date: DateTime<Utc>,
    pub reason: Option<String>,
    pub at: DateTime<Utc>,
}

/// Free-form run metadata supplied by the operator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunDetails {
    pub notes: Option<String>,
    pub client_reference: Option<String>,
}

/// A production run. Never deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductionRun {
    id: ProductionRunId,
    tenant_id: TenantId,
    recipe_id: RecipeId,
    recipe_name: String,
    product_code: String,
    silo_id: Option<StorageLocationId>,
    quantity: Decimal,
    planned_quantity: Option<Decimal>,
    status: RunStatus,
    scheduled_date: Option<DateTime<Utc>>,
    actual_start_time: Option<DateTime<Utc>>,
    actual_end_time: Option<DateTime<Utc>>,
    reschedule_history: Vec<RescheduleEntry>,
    delay_reason: Option<String>,
    cement_used: Decimal,
    operator_id: UserId,
    operator_name: String,
    details: RunDetails,
    usages: Vec<MaterialUsage>,
    version: u64,
    created_at: DateTime<Utc>,
}

impl ProductionRun {
    /// A run executed on the spot: planned equals actual, no variance.
    pub fn immediate(
        id: ProductionRunId,
        ctx: &OperatorContext,
        recipe: &Recipe,
        plan: &ConsumptionPlan,
        silo_id: Option<StorageLocationId>,
        details: RunDetails,
        at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let cement_used = plan.cement_total()?;
        let mut usages = MaterialUsage::planned(plan);
        for u in &mut usages {
            u.record_actual(u.planned_quantity, ActualSource::Recorded);
        }

        Ok(Self {
            id,
            tenant_id: ctx.tenant_id(),
            recipe_id: recipe.id_typed(),
            recipe_name: recipe.name().to_string(),
            product_code: recipe.product_code().to_string(),
            silo_id,
            quantity: plan.batch_quantity,
            planned_quantity: Some(plan.batch_quantity),
            status: RunStatus::Completed,
            scheduled_date: None,
            actual_start_time: Some(at),
            actual_end_time: Some(at),
            reschedule_history: Vec::new(),
            delay_reason: None,
            cement_used,
            operator_id: ctx.operator_id(),
            operator_name: ctx.operator_name().to_string(),
            details,
            usages,
            version: 1,
            created_at: at,
        })
    }

    /// A run planned for later. Usage rows are frozen from `plan` now; later
    /// recipe edits do not reach them.
    #[allow(clippy::too_many_arguments)]
    pub fn schedule(
        id: ProductionRunId,
        ctx: &OperatorContext,
        recipe: &Recipe,
        plan: &ConsumptionPlan,
        silo_id: StorageLocationId,
        scheduled_date: DateTime<Utc>,
        details: RunDetails,
        at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let planned = ensure_positive(plan.batch_quantity, "planned quantity")?;

        Ok(Self {
            id,
            tenant_id: ctx.tenant_id(),
            recipe_id: recipe.id_typed(),
            recipe_name: recipe.name().to_string(),
            product_code: recipe.product_code().to_string(),
            silo_id: Some(silo_id),
            quantity: planned,
            planned_quantity: Some(planned),
            status: RunStatus::Scheduled,
            scheduled_date: Some(scheduled_date),
            actual_start_time: None,
            actual_end_time: None,
            reschedule_history: Vec::new(),
            delay_reason: None,
            cement_used: Decimal::ZERO,
            operator_id: ctx.operator_id(),
            operator_name: ctx.operator_name().to_string(),
            details,
            usages: MaterialUsage::planned(plan),
            version: 1,
            created_at: at,
        })
    }

    pub fn reschedule(
        &mut self,
        new_date: DateTime<Utc>,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.ensure_status(&[RunStatus::Scheduled, RunStatus::Delayed], "reschedule")?;
        let reason = reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty());

        self.reschedule_history.push(RescheduleEntry {
            previous_date: self.scheduled_date,
            new_date,
            reason: reason.clone(),
            at,
        });
        self.scheduled_date = Some(new_date);
        if reason.is_some() {
            self.delay_reason = reason;
        }
        self.status = RunStatus::Rescheduled;
        self.version += 1;
        Ok(())
    }

    pub fn delay(&mut self, reason: &str) -> DomainResult<()> {
        self.ensure_status(&[RunStatus::Scheduled, RunStatus::Rescheduled], "delay")?;
        let reason = ensure_present(reason, "delay reason")?;

        self.delay_reason = Some(reason);
        self.status = RunStatus::Delayed;
        self.version += 1;
        Ok(())
    }

    pub fn start(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_status(&[RunStatus::Scheduled, RunStatus::Rescheduled], "start")?;

        self.actual_start_time = Some(at);
        self.status = RunStatus::InProgress;
        self.version += 1;
        Ok(())
    }

    /// Record actual output and usage.
    ///
    /// `overrides` maps material labels (case-insensitive) to actual
    /// quantities; materials without an override take their planned value
    /// and are marked [`ActualSource::Defaulted`]. Stock is not touched here:
    /// the caller deducts [`ProductionRun::consumption_deductions`] in the
    /// same unit of work that persists this state.
    pub fn complete(
        &mut self,
        actual_quantity: Decimal,
        overrides: &BTreeMap<String, Decimal>,
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.ensure_status(&[RunStatus::InProgress], "complete")?;
        let actual_quantity = ensure_positive(actual_quantity, "actual quantity")?;

        for (material, value) in overrides {
            if !self.usages.iter().any(|u| u.material.eq_ignore_ascii_case(material)) {
                return Err(DomainError::validation(format!(
                    "run has no material named '{material}'"
                )));
            }
            let same_material = overrides
                .keys()
                .filter(|m| m.eq_ignore_ascii_case(material))
                .count();
            if same_material > 1 {
                return Err(DomainError::validation(format!(
                    "actual usage of '{material}' is given more than once"
                )));
            }
            ensure_non_negative(*value, &format!("actual usage of {material}"))?;
        }

        let mut usages = self.usages.clone();
        for usage in &mut usages {
            let recorded = overrides
                .iter()
                .find(|(m, _)| m.eq_ignore_ascii_case(&usage.material))
                .map(|(_, v)| *v);
            match recorded {
                Some(v) => usage.record_actual(v, ActualSource::Recorded),
                None => usage.record_actual(usage.planned_quantity, ActualSource::Defaulted),
            }
        }
        let cement_used = checked_sum(
            usages
                .iter()
                .filter(|u| u.role == IngredientRole::Cement)
                .filter_map(|u| u.actual_quantity),
            "cement used",
        )?;

        self.usages = usages;
        self.cement_used = cement_used;
        self.quantity = actual_quantity;
        self.actual_end_time = Some(at);
        self.status = RunStatus::Completed;
        self.version += 1;
        Ok(())
    }

    /// What completing this run takes out of stock: actuals where recorded,
    /// otherwise the plan.
    pub fn consumption_deductions(&self) -> DomainResult<DeductionSet> {
        let mut set = DeductionSet::new();
        for u in &self.usages {
            if let Some(item_id) = u.item_id {
                set.add(item_id, u.actual_quantity.unwrap_or(u.planned_quantity))?;
            }
        }
        Ok(set)
    }

    fn ensure_status(&self, allowed: &[RunStatus], action: &str) -> DomainResult<()> {
        if allowed.contains(&self.status) {
            return Ok(());
        }
        Err(DomainError::invalid_state(format!(
            "cannot {action} run {} while it is {}",
            self.id, self.status
        )))
    }

    pub fn id_typed(&self) -> ProductionRunId {
        self.id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn recipe_id(&self) -> RecipeId {
        self.recipe_id
    }

    pub fn recipe_name(&self) -> &str {
        &self.recipe_name
    }

    pub fn product_code(&self) -> &str {
        &self.product_code
    }

    pub fn silo_id(&self) -> Option<StorageLocationId> {
        self.silo_id
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn planned_quantity(&self) -> Option<Decimal> {
        self.planned_quantity
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn scheduled_date(&self) -> Option<DateTime<Utc>> {
        self.scheduled_date
    }

    pub fn actual_start_time(&self) -> Option<DateTime<Utc>> {
        self.actual_start_time
    }

    pub fn actual_end_time(&self) -> Option<DateTime<Utc>> {
        self.actual_end_time
    }

    pub fn reschedule_history(&self) -> &[RescheduleEntry] {
        &self.reschedule_history
    }

    pub fn delay_reason(&self) -> Option<&str> {
        self.delay_reason.as_deref()
    }

    pub fn cement_used(&self) -> Decimal {
        self.cement_used
    }

    pub fn operator_id(&self) -> UserId {
        self.operator_id
    }

    pub fn operator_name(&self) -> &str {
        &self.operator_name
    }

    pub fn details(&self) -> &RunDetails {
        &self.details
    }

    pub fn usages(&self) -> &[MaterialUsage] {
        &self.usages
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }

    /// Output differs from plan.
    pub fn has_output_variance(&self) -> bool {
        self.planned_quantity.is_some_and(|p| p != self.quantity)
    }
}

impl Entity for ProductionRun {
    type Id = ProductionRunId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Versioned for ProductionRun {
    fn version(&self) -> u64 {
        self.version
    }
}
