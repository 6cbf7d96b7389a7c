//! Production domain module.
//!
//! Recipes, the production run lifecycle, consumption planning (scaling and
//! silo sourcing) and variance reporting. Pure and deterministic: timestamps
//! are passed in, stock is never touched here. The infra layer applies the
//! plans this crate produces inside its locked unit of work.

pub mod consumption;
pub mod notify;
pub mod recipe;
pub mod run;
pub mod variance;

pub use consumption::{ConsumptionPlan, MaterialRequirement, SiloSource, plan_for_recipe};
pub use notify::{NotificationDispatcher, ProductionNotification};
pub use recipe::{IngredientRole, Recipe, RecipeId, RecipeIngredient};
pub use run::{
    ActualSource, MaterialUsage, ProductionRun, ProductionRunId, RescheduleEntry, RunDetails,
    RunStatus,
};
pub use variance::{DateRange, MaterialVariance, VarianceReport};
