use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use plantops_core::quantity::{checked_sum, ensure_non_negative, ensure_present};
use plantops_core::{DomainError, DomainResult, Entity, TenantId};
use plantops_inventory::InventoryItemId;

plantops_core::entity_id!(RecipeId, "RecipeId");

/// How an ingredient is sourced at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngredientRole {
    /// Drawn from the silo the operator selects for the run, whatever the
    /// recipe's nominal binding says.
    Cement,
    /// Bulk material (aggregates, sand); consumed from its own binding.
    Bulk,
    /// Everything else; consumed from its own binding.
    Standard,
}

/// One line of a recipe, expressed per unit of output (typically per m³).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub material: String,
    /// Required on input; there is no default role.
    pub role: IngredientRole,
    pub item_id: Option<InventoryItemId>,
    pub quantity_per_unit: Decimal,
    pub unit: String,
}

/// A named formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    id: RecipeId,
    tenant_id: TenantId,
    product_code: String,
    name: String,
    ingredients: Vec<RecipeIngredient>,
    total_weight: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Recipe {
    /// Validate and build a recipe.
    ///
    /// Uniqueness of the product code and existence of bound items are checked
    /// by the catalog, which has the store; everything local is checked here.
    pub fn create(
        id: RecipeId,
        tenant_id: TenantId,
        product_code: &str,
        name: &str,
        ingredients: Vec<RecipeIngredient>,
        at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let product_code = ensure_present(product_code, "product code")?;
        let name = ensure_present(name, "recipe name")?;
        let ingredients = validate_ingredients(ingredients)?;
        let total_weight = total_weight(&ingredients)?;

        Ok(Self {
            id,
            tenant_id,
            product_code,
            name,
            total_weight,
            ingredients,
            created_at: at,
            updated_at: at,
        })
    }

    /// Replace the formula (and optionally the display name).
    ///
    /// Runs already scheduled keep their own frozen usage rows.
    pub fn revise(
        &mut self,
        name: Option<&str>,
        ingredients: Vec<RecipeIngredient>,
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        let name = match name {
            Some(n) => ensure_present(n, "recipe name")?,
            None => self.name.clone(),
        };
        let ingredients = validate_ingredients(ingredients)?;
        let total_weight = total_weight(&ingredients)?;

        self.name = name;
        self.total_weight = total_weight;
        self.ingredients = ingredients;
        self.updated_at = at;
        Ok(())
    }

    pub fn id_typed(&self) -> RecipeId {
        self.id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn product_code(&self) -> &str {
        &self.product_code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ingredients(&self) -> &[RecipeIngredient] {
        &self.ingredients
    }

    pub fn total_weight(&self) -> Decimal {
        self.total_weight
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// True when a run of this recipe needs a silo selection.
    pub fn requires_silo(&self) -> bool {
        self.ingredients
            .iter()
            .any(|i| i.role == IngredientRole::Cement && !i.quantity_per_unit.is_zero())
    }

    /// Item ids the recipe binds (nonzero lines only), in recipe order.
    pub fn bound_items(&self) -> impl Iterator<Item = InventoryItemId> + '_ {
        self.ingredients
            .iter()
            .filter(|i| !i.quantity_per_unit.is_zero())
            .filter_map(|i| i.item_id)
    }
}

impl Entity for Recipe {
    type Id = RecipeId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn validate_ingredients(ingredients: Vec<RecipeIngredient>) -> DomainResult<Vec<RecipeIngredient>> {
    if ingredients.is_empty() {
        return Err(DomainError::validation("recipe needs at least one ingredient"));
    }

    let mut seen: Vec<String> = Vec::with_capacity(ingredients.len());
    let mut out = Vec::with_capacity(ingredients.len());

    for ing in ingredients {
        let material = ensure_present(&ing.material, "ingredient material")?;
        let unit = ensure_present(&ing.unit, "ingredient unit")?;
        ensure_non_negative(ing.quantity_per_unit, &format!("quantity of {material}"))?;

        // Completion overrides are keyed by material label.
        if seen.iter().any(|m| m.eq_ignore_ascii_case(&material)) {
            return Err(DomainError::validation(format!(
                "ingredient '{material}' is listed twice"
            )));
        }

        if !ing.quantity_per_unit.is_zero() && ing.item_id.is_none() {
            return Err(DomainError::linkage(format!(
                "ingredient '{material}' has a quantity but no inventory item"
            )));
        }

        seen.push(material.clone());
        out.push(RecipeIngredient {
            material,
            unit,
            ..ing
        });
    }

    Ok(out)
}

fn total_weight(ingredients: &[RecipeIngredient]) -> DomainResult<Decimal> {
    checked_sum(ingredients.iter().map(|i| i.quantity_per_unit), "recipe total weight")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(material: &str, role: IngredientRole, qty: Decimal, unit: &str) -> RecipeIngredient {
        RecipeIngredient {
            material: material.into(),
            role,
            item_id: Some(InventoryItemId::generate()),
            quantity_per_unit: qty,
            unit: unit.into(),
        }
    }

    fn c25() -> Vec<RecipeIngredient> {
        vec![
            line("Cement", IngredientRole::Cement, dec!(300), "kg"),
            line("Water", IngredientRole::Standard, dec!(180), "L"),
            line("Gravel 20mm", IngredientRole::Bulk, dec!(1100), "kg"),
        ]
    }

    #[test]
    fn total_weight_is_sum_of_quantities() {
        let r = Recipe::create(RecipeId::generate(), TenantId::new(), "C25", "C25/30", c25(), Utc::now())
            .unwrap();
        assert_eq!(r.total_weight(), dec!(1580));
        assert!(r.requires_silo());
        assert_eq!(r.bound_items().count(), 3);
    }

    #[test]
    fn blank_product_code_is_rejected() {
        let err = Recipe::create(RecipeId::generate(), TenantId::new(), " ", "C25", c25(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn unbound_nonzero_ingredient_is_a_linkage_error() {
        let mut lines = c25();
        lines[1].item_id = None;
        let err = Recipe::create(RecipeId::generate(), TenantId::new(), "C25", "C25", lines, Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::Linkage(msg) if msg.contains("Water")));
    }

    #[test]
    fn unbound_zero_ingredient_is_allowed() {
        let mut lines = c25();
        lines.push(RecipeIngredient {
            material: "Fibre".into(),
            role: IngredientRole::Standard,
            item_id: None,
            quantity_per_unit: dec!(0),
            unit: "kg".into(),
        });
        assert!(Recipe::create(RecipeId::generate(), TenantId::new(), "C25F", "C25 fibre", lines, Utc::now()).is_ok());
    }

    #[test]
    fn duplicate_material_labels_are_rejected() {
        let mut lines = c25();
        lines.push(line("water", IngredientRole::Standard, dec!(5), "L"));
        let err = Recipe::create(RecipeId::generate(), TenantId::new(), "C25", "C25", lines, Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn cement_free_recipe_needs_no_silo() {
        let lines = vec![line("Sand", IngredientRole::Bulk, dec!(1), "t")];
        let r = Recipe::create(RecipeId::generate(), TenantId::new(), "SAND", "Screed sand", lines, Utc::now())
            .unwrap();
        assert!(!r.requires_silo());
    }

    #[test]
    fn unrepresentable_total_weight_is_rejected() {
        let lines = vec![
            line("Gravel", IngredientRole::Bulk, Decimal::MAX, "kg"),
            line("Sand", IngredientRole::Bulk, Decimal::MAX, "kg"),
        ];
        let err = Recipe::create(RecipeId::generate(), TenantId::new(), "HUGE", "Huge", lines, Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn revise_replaces_formula_and_weight() {
        let mut r = Recipe::create(RecipeId::generate(), TenantId::new(), "C25", "C25", c25(), Utc::now())
            .unwrap();
        let mut lines = c25();
        lines[0].quantity_per_unit = dec!(320);

        r.revise(Some("C25/30 rev B"), lines, Utc::now()).unwrap();

        assert_eq!(r.name(), "C25/30 rev B");
        assert_eq!(r.ingredients()[0].quantity_per_unit, dec!(320));
        assert_eq!(r.total_weight(), dec!(1600));
    }
}
