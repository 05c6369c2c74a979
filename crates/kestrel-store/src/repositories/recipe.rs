//! In-memory implementation of RecipeRepository.

use crate::SharedState;
use async_trait::async_trait;
use kestrel_core::ids::RecipeId;
use kestrel_core::ports::RecipeRepository;
use kestrel_core::recipe::Recipe;
use kestrel_core::{Error, Result};
use tracing::debug;

pub struct MemRecipeRepository {
    state: SharedState,
}

impl MemRecipeRepository {
    pub(crate) fn new(state: SharedState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl RecipeRepository for MemRecipeRepository {
    async fn create(&self, recipe: &Recipe) -> Result<RecipeId> {
        let mut state = self.state.write().await;
        if state.recipes.contains_key(&recipe.id) {
            return Err(Error::Conflict {
                entity: "recipe",
                id: recipe.id.to_string(),
            });
        }
        state.recipes.insert(recipe.id, recipe.clone());
        debug!(recipe_id = %recipe.id, name = %recipe.name, "Stored recipe");
        Ok(recipe.id)
    }

    async fn get(&self, id: RecipeId) -> Result<Option<Recipe>> {
        Ok(self.state.read().await.recipes.get(&id).cloned())
    }

    async fn get_many(&self, ids: &[RecipeId]) -> Result<Vec<Recipe>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.recipes.get(id).cloned())
            .collect())
    }

    async fn list_for_repository(&self, repository: &str) -> Result<Vec<Recipe>> {
        let state = self.state.read().await;
        let mut recipes: Vec<Recipe> = state
            .recipes
            .values()
            .filter(|r| r.repository == repository)
            .cloned()
            .collect();
        recipes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(recipes)
    }
}

#[cfg(test)]
mod tests {
    use crate::MemoryStore;
    use kestrel_core::recipe::Recipe;
    use kestrel_core::Error;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_list_for_repository_sorted_by_name() {
        let store = MemoryStore::new();
        let recipes = store.recipes();
        for recipe in [
            Recipe::new("test", "Test").with_repository("org/proj"),
            Recipe::new("build", "Build").with_repository("org/proj"),
            Recipe::new("build", "Build").with_repository("org/other"),
        ] {
            recipes.create(&recipe).await.unwrap();
        }

        let names: Vec<String> = recipes
            .list_for_repository("org/proj")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["build".to_string(), "test".to_string()]);
        assert!(recipes.list_for_repository("org/none").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_recipe_conflicts() {
        let store = MemoryStore::new();
        let recipe = Recipe::new("build", "Build");
        store.recipes().create(&recipe).await.unwrap();

        let err = store.recipes().create(&recipe).await.unwrap_err();
        assert!(matches!(err, Error::Conflict { entity: "recipe", .. }));
    }
}
