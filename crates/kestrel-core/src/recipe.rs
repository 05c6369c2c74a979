//! Recipe definition types.
//!
//! A recipe is a reusable, versioned build pipeline. Recipes of one repository
//! depend on each other and form a DAG; each dependency edge carries its own
//! `abort_on_failure` flag.

use crate::ids::RecipeId;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Recipe {
    pub id: RecipeId,
    pub name: String,
    pub display_name: String,
    /// Repository the recipe belongs to, as `owner/name`.
    #[serde(default)]
    pub repository: String,
    /// Higher priorities are scheduled earlier within a tier. Negative
    /// priorities sort below the default of zero.
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub build_configs: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<RecipeDependency>,
    #[serde(default)]
    pub steps: Vec<StepDefinition>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl Recipe {
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: RecipeId::new(),
            name: name.into(),
            display_name: display_name.into(),
            repository: String::new(),
            priority: 0,
            active: true,
            build_configs: vec![],
            dependencies: vec![],
            steps: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = repository.into();
        self
    }

    pub fn with_build_config(mut self, config: impl Into<String>) -> Self {
        self.build_configs.push(config.into());
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Add a dependency on another recipe.
    pub fn depends_on(mut self, recipe: RecipeId, abort_on_failure: bool) -> Self {
        self.dependencies.push(RecipeDependency {
            recipe,
            abort_on_failure,
        });
        self
    }

    /// Append a step at the next position.
    pub fn with_step(mut self, step: StepDefinition) -> Self {
        let position = self.steps.len() as u32;
        self.steps.push(StepDefinition { position, ..step });
        self
    }

    pub fn dependency_ids(&self) -> impl Iterator<Item = RecipeId> + '_ {
        self.dependencies.iter().map(|d| d.recipe)
    }
}

/// Edge from a recipe to a recipe it depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RecipeDependency {
    pub recipe: RecipeId,
    /// When set, a failed or canceled upstream job keeps the dependent from running.
    #[serde(default = "default_true")]
    pub abort_on_failure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StepDefinition {
    pub name: String,
    pub filename: String,
    #[serde(default)]
    pub position: u32,
    /// Stop the job when this step fails.
    #[serde(default = "default_true")]
    pub abort_on_failure: bool,
    /// Record a failure of this step as `FailedOk` instead of `Failed`.
    #[serde(default)]
    pub allowed_to_fail: bool,
}

impl StepDefinition {
    pub fn new(name: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filename: filename.into(),
            position: 0,
            abort_on_failure: true,
            allowed_to_fail: false,
        }
    }

    pub fn allowed_to_fail(mut self) -> Self {
        self.allowed_to_fail = true;
        self
    }

    pub fn continue_on_failure(mut self) -> Self {
        self.abort_on_failure = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_are_positioned_in_order() {
        let recipe = Recipe::new("build", "Build")
            .with_step(StepDefinition::new("configure", "configure.sh"))
            .with_step(StepDefinition::new("make", "make.sh").allowed_to_fail());

        let positions: Vec<u32> = recipe.steps.iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![0, 1]);
        assert!(recipe.steps[1].allowed_to_fail);
        assert!(recipe.steps[1].abort_on_failure);
    }

    #[test]
    fn test_dependency_defaults_to_abort() {
        let json = format!(r#"{{"recipe": "{}"}}"#, RecipeId::new().as_uuid());
        let dep: RecipeDependency = serde_json::from_str(&json).unwrap();
        assert!(dep.abort_on_failure);
    }
}
