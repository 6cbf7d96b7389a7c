//! Consumption planning: scale a recipe and decide where each ingredient
//! comes from.
//!
//! Planning is pure. It reads item state only to check bindings and capture
//! unit costs; availability is checked later, under the store's item locks.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use plantops_core::quantity::{checked_mul, checked_sum, ensure_positive};
use plantops_core::{DomainError, DomainResult};
use plantops_inventory::{DeductionSet, InventoryItem, InventoryItemId, StorageLocation};

use crate::recipe::{IngredientRole, Recipe};

/// The operator's silo choice, with its resolved cement item.
#[derive(Debug, Clone, Copy)]
pub struct SiloSource<'a> {
    pub silo: &'a StorageLocation,
    pub cement: &'a InventoryItem,
}

/// What one ingredient needs for a given batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialRequirement {
    pub material: String,
    pub role: IngredientRole,
    /// The consuming item (`None` only for zero-quantity, unbound lines).
    pub item_id: Option<InventoryItemId>,
    pub per_unit: Decimal,
    pub required: Decimal,
    pub unit: String,
    pub unit_cost: Option<Decimal>,
}

/// A scaled recipe ready to be deducted or frozen into usage rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumptionPlan {
    pub batch_quantity: Decimal,
    pub requirements: Vec<MaterialRequirement>,
}

impl ConsumptionPlan {
    /// Deductions summed per consuming item, in recipe order.
    pub fn deductions(&self) -> DomainResult<DeductionSet> {
        let mut set = DeductionSet::new();
        for r in &self.requirements {
            if let Some(item_id) = r.item_id {
                set.add(item_id, r.required)?;
            }
        }
        Ok(set)
    }

    /// Total drawn by cement-role ingredients.
    pub fn cement_total(&self) -> DomainResult<Decimal> {
        checked_sum(
            self.requirements
                .iter()
                .filter(|r| r.role == IngredientRole::Cement)
                .map(|r| r.required),
            "cement total",
        )
    }
}

/// Scale `recipe` to `quantity` units and resolve sourcing.
///
/// - `required = per_unit × quantity` for every ingredient, exactly.
/// - Cement-role lines consume `silo.cement`, overriding their binding.
/// - Every other nonzero line consumes its own bound item, which `lookup`
///   must resolve.
pub fn plan_for_recipe<'a, F>(
    recipe: &Recipe,
    quantity: Decimal,
    silo: Option<SiloSource<'_>>,
    lookup: F,
) -> DomainResult<ConsumptionPlan>
where
    F: Fn(&InventoryItemId) -> Option<&'a InventoryItem>,
{
    let quantity = ensure_positive(quantity, "batch quantity")?;

    if recipe.requires_silo() && silo.is_none() {
        return Err(DomainError::validation(format!(
            "recipe '{}' contains cement; a silo must be selected",
            recipe.name()
        )));
    }
    if let Some(s) = silo {
        if s.cement.location_id() != Some(s.silo.id_typed()) || !s.cement.is_cement() {
            return Err(DomainError::linkage(format!(
                "item '{}' is not the cement stored in silo '{}'",
                s.cement.name(),
                s.silo.name()
            )));
        }
    }

    let mut requirements = Vec::with_capacity(recipe.ingredients().len());
    for ing in recipe.ingredients() {
        let required = checked_mul(
            ing.quantity_per_unit,
            quantity,
            &format!("required quantity of '{}'", ing.material),
        )?;

        let source = match (ing.role, silo) {
            (IngredientRole::Cement, Some(s)) if !required.is_zero() => Some(s.cement),
            _ => match ing.item_id {
                Some(id) => match lookup(&id) {
                    Some(item) => Some(item),
                    None if required.is_zero() => None,
                    None => {
                        return Err(DomainError::linkage(format!(
                            "ingredient '{}' is bound to missing inventory item {id}",
                            ing.material
                        )));
                    }
                },
                None if required.is_zero() => None,
                None => {
                    return Err(DomainError::linkage(format!(
                        "ingredient '{}' has no inventory item",
                        ing.material
                    )));
                }
            },
        };

        requirements.push(MaterialRequirement {
            material: ing.material.clone(),
            role: ing.role,
            item_id: source.map(|i| i.id_typed()),
            per_unit: ing.quantity_per_unit,
            required,
            unit: ing.unit.clone(),
            unit_cost: source.and_then(|i| i.unit_cost()),
        });
    }

    Ok(ConsumptionPlan {
        batch_quantity: quantity,
        requirements,
    })
}
