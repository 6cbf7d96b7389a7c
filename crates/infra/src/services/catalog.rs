use chrono::Utc;
use tracing::{info, instrument};

use plantops_core::{DomainError, OperatorContext};
use plantops_production::{Recipe, RecipeId, RecipeIngredient};

use crate::store::{PlantStore, StoreResult};

/// Input for [`RecipeCatalog::create_recipe`].
#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub product_code: String,
    pub name: String,
    pub ingredients: Vec<RecipeIngredient>,
}

/// Recipe authoring against the store.
#[derive(Debug, Clone)]
pub struct RecipeCatalog<S> {
    store: S,
}

impl<S: PlantStore> RecipeCatalog<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[instrument(skip_all, fields(tenant = %ctx.tenant_id(), product_code = %input.product_code), err)]
    pub fn create_recipe(&self, ctx: &OperatorContext, input: NewRecipe) -> StoreResult<Recipe> {
        let recipe = Recipe::create(
            RecipeId::generate(),
            ctx.tenant_id(),
            &input.product_code,
            &input.name,
            input.ingredients,
            Utc::now(),
        )?;
        self.ensure_bindings_resolve(ctx, &recipe)?;
        self.store.insert_recipe(recipe.clone())?;

        info!(recipe = %recipe.id_typed(), "recipe created");
        Ok(recipe)
    }

    /// Replace a recipe's formula. Scheduled runs keep their frozen usage.
    #[instrument(skip_all, fields(tenant = %ctx.tenant_id(), recipe = %id), err)]
    pub fn revise_recipe(
        &self,
        ctx: &OperatorContext,
        id: RecipeId,
        name: Option<&str>,
        ingredients: Vec<RecipeIngredient>,
    ) -> StoreResult<Recipe> {
        let mut recipe = self.get_recipe(ctx, id)?;
        recipe.revise(name, ingredients, Utc::now())?;
        self.ensure_bindings_resolve(ctx, &recipe)?;
        self.store.update_recipe(recipe.clone())?;

        info!("recipe revised");
        Ok(recipe)
    }

    #[instrument(skip_all, fields(tenant = %ctx.tenant_id(), recipe = %id), err)]
    pub fn delete_recipe(&self, ctx: &OperatorContext, id: RecipeId) -> StoreResult<()> {
        self.store.delete_recipe(ctx.tenant_id(), id)?;
        info!("recipe deleted");
        Ok(())
    }

    pub fn get_recipe(&self, ctx: &OperatorContext, id: RecipeId) -> StoreResult<Recipe> {
        self.store
            .recipe(ctx.tenant_id(), id)?
            .ok_or_else(|| DomainError::not_found(format!("recipe {id}")).into())
    }

    pub fn list_recipes(&self, ctx: &OperatorContext) -> StoreResult<Vec<Recipe>> {
        self.store.list_recipes(ctx.tenant_id())
    }

    fn ensure_bindings_resolve(&self, ctx: &OperatorContext, recipe: &Recipe) -> StoreResult<()> {
        for ing in recipe.ingredients().iter().filter(|i| !i.quantity_per_unit.is_zero()) {
            let Some(item_id) = ing.item_id else {
                continue;
            };
            if self.store.item(ctx.tenant_id(), item_id)?.is_none() {
                return Err(DomainError::linkage(format!(
                    "ingredient '{}' is bound to unknown inventory item {item_id}",
                    ing.material
                ))
                .into());
            }
        }
        Ok(())
    }
}
