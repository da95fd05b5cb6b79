use crate::collapsible::CollapsibleGraphModel;
use crate::components::{parse_size_rank, validate_size_rank};
use crate::error::{Result, ScopeError};
use crate::store::{PersistedComponent, PersistedStore};
use std::path::Path;
use tracing::debug;

/// Browsing session over a loaded store
#[derive(Debug)]
pub struct Viewer {
    store: PersistedStore,
}

impl Viewer {
    /// Open a store. At least one component must carry a layout.
    pub fn new(store: PersistedStore) -> Result<Self> {
        if !store.components.iter().any(PersistedComponent::is_laid_out) {
            return Err(ScopeError::NoLaidOutComponents);
        }
        Ok(Viewer { store })
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(PersistedStore::load_json(path)?)
    }

    pub fn store(&self) -> &PersistedStore {
        &self.store
    }

    pub fn component_count(&self) -> usize {
        self.store.components.len()
    }

    /// Parse a size rank typed by the user
    pub fn parse_rank(&self, raw: &str) -> Result<usize> {
        parse_size_rank(raw, self.component_count())
    }

    /// Size rank of the component holding the node called `name`
    pub fn component_rank_of(&self, name: &str) -> Result<usize> {
        self.store
            .components
            .iter()
            .find(|c| c.has_node_named(name))
            .map(|c| c.size_rank)
            .ok_or_else(|| ScopeError::NodeNameNotFound(name.to_string()))
    }

    /// Build the collapsible model for one laid-out component
    pub fn load_component(&self, size_rank: usize) -> Result<CollapsibleGraphModel> {
        let rank = validate_size_rank(size_rank, self.component_count())?;
        let component = self
            .store
            .component(rank)
            .ok_or(ScopeError::ComponentNotLaidOut(rank))?;
        let layout = component
            .layout
            .clone()
            .ok_or(ScopeError::ComponentNotLaidOut(rank))?;
        let (graph, forest) = component.to_parts()?;
        debug!(
            rank,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            patterns = forest.len(),
            "loading component"
        );
        CollapsibleGraphModel::new(graph, forest, layout)
    }
}
