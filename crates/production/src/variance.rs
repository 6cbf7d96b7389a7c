//! Planned-vs-actual reporting over completed runs.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use plantops_core::quantity::{checked_add, checked_mul};
use plantops_core::{DomainError, DomainResult};

use crate::run::{ActualSource, ProductionRun, ProductionRunId};

/// Half-open completion window `[from, to)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl DateRange {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> DomainResult<Self> {
        if to <= from {
            return Err(DomainError::validation("date range must end after it starts"));
        }
        Ok(Self { from, to })
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from <= at && at < self.to
    }
}

/// One nonzero material deviation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialVariance {
    pub run_id: ProductionRunId,
    pub recipe_name: String,
    pub material: String,
    pub planned: Decimal,
    pub actual: Decimal,
    pub variance: Decimal,
    pub unit: String,
    /// The actual was filled in from the plan rather than recorded.
    pub defaulted: bool,
    /// `variance × unit cost`, when the item had a cost.
    pub variance_cost: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarianceReport {
    pub range: DateRange,
    pub total_runs: usize,
    pub runs_with_variance: usize,
    pub total_planned: Decimal,
    pub total_actual: Decimal,
    /// `total_actual − total_planned`.
    pub total_variance: Decimal,
    pub material_variances: Vec<MaterialVariance>,
    pub defaulted_actuals: usize,
}

impl VarianceReport {
    /// Aggregate completed runs whose end time falls inside `range`. Runs in
    /// any other state are ignored. Totals too large to represent are a
    /// validation error.
    pub fn build<'a, I>(runs: I, range: DateRange) -> DomainResult<Self>
    where
        I: IntoIterator<Item = &'a ProductionRun>,
    {
        let mut report = VarianceReport {
            range,
            total_runs: 0,
            runs_with_variance: 0,
            total_planned: Decimal::ZERO,
            total_actual: Decimal::ZERO,
            total_variance: Decimal::ZERO,
            material_variances: Vec::new(),
            defaulted_actuals: 0,
        };

        let completed = runs.into_iter().filter(|r| {
            r.is_completed() && r.actual_end_time().is_some_and(|t| range.contains(t))
        });

        for run in completed {
            report.total_runs += 1;
            if run.has_output_variance() {
                report.runs_with_variance += 1;
            }
            report.total_planned = checked_add(
                report.total_planned,
                run.planned_quantity().unwrap_or(run.quantity()),
                "total planned quantity",
            )?;
            report.total_actual = checked_add(report.total_actual, run.quantity(), "total actual quantity")?;

            for usage in run.usages() {
                let defaulted = usage.actual_source == Some(ActualSource::Defaulted);
                if defaulted {
                    report.defaulted_actuals += 1;
                }

                let actual = usage.actual_quantity.unwrap_or(usage.planned_quantity);
                let variance = usage.variance.unwrap_or(actual - usage.planned_quantity);
                if variance.is_zero() {
                    continue;
                }

                let variance_cost = usage
                    .unit_cost
                    .map(|c| checked_mul(c, variance, "variance cost"))
                    .transpose()?;

                report.material_variances.push(MaterialVariance {
                    run_id: run.id_typed(),
                    recipe_name: run.recipe_name().to_string(),
                    material: usage.material.clone(),
                    planned: usage.planned_quantity,
                    actual,
                    variance,
                    unit: usage.unit.clone(),
                    defaulted,
                    variance_cost,
                });
            }
        }

        report.total_variance = report.total_actual - report.total_planned;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consumption::{ConsumptionPlan, MaterialRequirement};
    use crate::recipe::{IngredientRole, Recipe, RecipeId, RecipeIngredient};
    use crate::run::RunDetails;
    use chrono::{Duration, TimeZone};
    use plantops_core::{OperatorContext, TenantId, UserId};
    use plantops_inventory::{InventoryItemId, StorageLocationId};
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap()
    }

    fn fixtures() -> (OperatorContext, Recipe, ConsumptionPlan) {
        let ctx = OperatorContext::new(TenantId::new(), UserId::new(), "Sara");
        let item = InventoryItemId::generate();
        let recipe = Recipe::create(
            RecipeId::generate(),
            ctx.tenant_id(),
            "C30",
            "C30/37",
            vec![RecipeIngredient {
                material: "Cement".into(),
                role: IngredientRole::Cement,
                item_id: Some(item),
                quantity_per_unit: dec!(350),
                unit: "kg".into(),
            }],
            at(1),
        )
        .unwrap();
        let plan = ConsumptionPlan {
            batch_quantity: dec!(10),
            requirements: vec![MaterialRequirement {
                material: "Cement".into(),
                role: IngredientRole::Cement,
                item_id: Some(item),
                per_unit: dec!(350),
                required: dec!(3500),
                unit: "kg".into(),
                unit_cost: Some(dec!(0.15)),
            }],
        };
        (ctx, recipe, plan)
    }

    fn completed(
        actual_qty: Decimal,
        cement: Option<Decimal>,
        end: DateTime<Utc>,
    ) -> ProductionRun {
        let (ctx, recipe, plan) = fixtures();
        let mut run = ProductionRun::schedule(
            ProductionRunId::generate(),
            &ctx,
            &recipe,
            &plan,
            StorageLocationId::generate(),
            end,
            RunDetails::default(),
            at(1),
        )
        .unwrap();
        run.start(end - Duration::hours(2)).unwrap();
        let overrides: BTreeMap<String, Decimal> =
            cement.map(|c| ("Cement".to_string(), c)).into_iter().collect();
        run.complete(actual_qty, &overrides, end).unwrap();
        run
    }

    #[test]
    fn reports_output_and_material_variance() {
        let runs = vec![
            completed(dec!(9.5), Some(dec!(3600)), at(10)),
            completed(dec!(10), None, at(11)),
        ];
        let report = VarianceReport::build(&runs, DateRange::new(at(1), at(31)).unwrap()).unwrap();

        assert_eq!(report.total_runs, 2);
        assert_eq!(report.runs_with_variance, 1);
        assert_eq!(report.total_planned, dec!(20));
        assert_eq!(report.total_actual, dec!(19.5));
        assert_eq!(report.total_variance, dec!(-0.5));
        assert_eq!(report.defaulted_actuals, 1);

        assert_eq!(report.material_variances.len(), 1);
        let mv = &report.material_variances[0];
        assert_eq!(mv.variance, dec!(100));
        assert_eq!(mv.variance_cost, Some(dec!(15.00)));
        assert!(!mv.defaulted);
    }

    #[test]
    fn range_is_half_open_on_completion_time() {
        let runs = vec![completed(dec!(10), None, at(5)), completed(dec!(10), None, at(6))];
        let report = VarianceReport::build(&runs, DateRange::new(at(5), at(6)).unwrap()).unwrap();
        assert_eq!(report.total_runs, 1);
    }

    #[test]
    fn unfinished_runs_are_ignored() {
        let (ctx, recipe, plan) = fixtures();
        let scheduled = ProductionRun::schedule(
            ProductionRunId::generate(),
            &ctx,
            &recipe,
            &plan,
            StorageLocationId::generate(),
            at(4),
            RunDetails::default(),
            at(1),
        )
        .unwrap();

        let report = VarianceReport::build([&scheduled], DateRange::new(at(1), at(31)).unwrap()).unwrap();
        assert_eq!(report.total_runs, 0);
        assert!(report.material_variances.is_empty());
    }

    #[test]
    fn unrepresentable_totals_are_a_validation_error() {
        let runs = vec![
            completed(Decimal::MAX, None, at(10)),
            completed(Decimal::MAX, None, at(11)),
        ];

        let err = VarianceReport::build(&runs, DateRange::new(at(1), at(31)).unwrap()).unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn inverted_range_is_rejected() {
        assert!(matches!(DateRange::new(at(5), at(5)), Err(DomainError::Validation(_))));
    }
}
