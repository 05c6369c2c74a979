//! Recipe dependency graph.

use kestrel_core::ids::RecipeId;
use kestrel_core::recipe::Recipe;
use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Cycle detected in recipe dependencies at {0}")]
    CycleDetected(String),
    #[error("Recipe {recipe} depends on unknown recipe {dependency}")]
    UnknownDependency {
        recipe: String,
        dependency: RecipeId,
    },
    #[error("Recipe added twice: {0}")]
    DuplicateRecipe(String),
}

impl From<GraphError> for kestrel_core::Error {
    fn from(err: GraphError) -> Self {
        kestrel_core::Error::Scheduling(err.to_string())
    }
}

/// A recipe as seen by the scheduler.
#[derive(Debug, Clone)]
pub struct RecipeNode {
    pub id: RecipeId,
    pub name: String,
    pub display_name: String,
    pub priority: i32,
}

/// Edge from a dependency to its dependent.
#[derive(Debug, Clone, Copy)]
struct DependencyEdge {
    abort_on_failure: bool,
}

/// Directed acyclic graph of recipe dependencies, indexed by recipe id.
///
/// Edges point from a dependency to the recipe that depends on it.
#[derive(Debug)]
pub struct RecipeGraph {
    graph: DiGraph<RecipeNode, DependencyEdge>,
    id_to_index: HashMap<RecipeId, NodeIndex>,
}

impl RecipeGraph {
    /// Build the graph, rejecting unknown dependencies and cycles.
    pub fn build(recipes: &[Recipe]) -> Result<Self, GraphError> {
        let mut graph = DiGraph::new();
        let mut id_to_index = HashMap::new();

        for recipe in recipes {
            if id_to_index.contains_key(&recipe.id) {
                return Err(GraphError::DuplicateRecipe(recipe.name.clone()));
            }
            let idx = graph.add_node(RecipeNode {
                id: recipe.id,
                name: recipe.name.clone(),
                display_name: recipe.display_name.clone(),
                priority: recipe.priority,
            });
            id_to_index.insert(recipe.id, idx);
        }

        for recipe in recipes {
            let recipe_idx = id_to_index[&recipe.id];
            for dep in &recipe.dependencies {
                let dep_idx = id_to_index.get(&dep.recipe).ok_or_else(|| {
                    GraphError::UnknownDependency {
                        recipe: recipe.name.clone(),
                        dependency: dep.recipe,
                    }
                })?;
                graph.update_edge(
                    *dep_idx,
                    recipe_idx,
                    DependencyEdge {
                        abort_on_failure: dep.abort_on_failure,
                    },
                );
            }
        }

        let graph = RecipeGraph { graph, id_to_index };
        graph.topological_order()?;
        Ok(graph)
    }

    pub fn get(&self, id: RecipeId) -> Option<&RecipeNode> {
        self.id_to_index
            .get(&id)
            .and_then(|&idx| self.graph.node_weight(idx))
    }

    pub fn contains(&self, id: RecipeId) -> bool {
        self.id_to_index.contains_key(&id)
    }

    /// Recipes that `id` depends on, with each edge's `abort_on_failure`.
    pub fn dependencies(&self, id: RecipeId) -> Vec<(&RecipeNode, bool)> {
        let Some(&idx) = self.id_to_index.get(&id) else {
            return vec![];
        };
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .filter_map(|edge| {
                self.graph
                    .node_weight(edge.source())
                    .map(|node| (node, edge.weight().abort_on_failure))
            })
            .collect()
    }

    pub fn dependency_ids(&self, id: RecipeId) -> impl Iterator<Item = RecipeId> + '_ {
        self.dependencies(id).into_iter().map(|(node, _)| node.id)
    }

    /// Recipes in an order where every dependency precedes its dependents.
    pub fn topological_order(&self) -> Result<Vec<&RecipeNode>, GraphError> {
        toposort(&self.graph, None)
            .map(|indices| {
                indices
                    .iter()
                    .filter_map(|&idx| self.graph.node_weight(idx))
                    .collect()
            })
            .map_err(|cycle| {
                let name = self
                    .graph
                    .node_weight(cycle.node_id())
                    .map(|n| n.name.clone())
                    .unwrap_or_default();
                GraphError::CycleDetected(name)
            })
    }
}
