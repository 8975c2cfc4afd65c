//! In-memory scene adapter.
//!
//! [`MemoryNode`] implements [`SceneNode`] with plain fields; [`MemoryScene`]
//! keeps named nodes and models so descriptors and tools can resolve them.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::node::{MaterialMapping, ModelHandle, SceneNode, SharedNode};

/// Scene-related errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    #[error("Duplicate node name: {0}")]
    DuplicateNode(String),

    #[error("Duplicate model name: {0}")]
    DuplicateModel(String),
}

/// A scene node backed by plain fields
#[derive(Debug, Clone)]
pub struct MemoryNode {
    pub name: String,
    pub visible: bool,
    pub model: Option<ModelHandle>,
    pub material_mapping: Option<MaterialMapping>,
    /// Number of times decorations were reapplied
    pub decoration_passes: u32,
}

impl MemoryNode {
    /// Create a visible node with no model installed
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visible: true,
            model: None,
            material_mapping: None,
            decoration_passes: 0,
        }
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_model(mut self, model: ModelHandle) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_material_mapping(mut self, mapping: MaterialMapping) -> Self {
        self.material_mapping = Some(mapping);
        self
    }
}

impl SceneNode for MemoryNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn model(&self) -> Option<ModelHandle> {
        self.model
    }

    fn set_model(&mut self, model: Option<ModelHandle>) {
        // A new model invalidates slot indices of the previous one
        if self.model != model {
            self.material_mapping = None;
        }
        self.model = model;
    }

    fn material_mapping(&self) -> Option<&MaterialMapping> {
        self.material_mapping.as_ref()
    }

    fn set_material_mapping(&mut self, mapping: MaterialMapping) {
        self.material_mapping = Some(mapping);
    }

    fn reapply_decorations(&mut self) {
        self.decoration_passes += 1;
    }
}

/// Named nodes and models of a headless scene
#[derive(Default)]
pub struct MemoryScene {
    nodes: Vec<Arc<RwLock<MemoryNode>>>,
    node_index: HashMap<String, usize>,
    models: HashMap<String, ModelHandle>,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node; node names must be unique
    pub fn add_node(&mut self, node: MemoryNode) -> Result<SharedNode, SceneError> {
        if self.node_index.contains_key(&node.name) {
            return Err(SceneError::DuplicateNode(node.name));
        }

        let name = node.name.clone();
        let node = Arc::new(RwLock::new(node));
        self.node_index.insert(name, self.nodes.len());
        self.nodes.push(node.clone());
        Ok(node as SharedNode)
    }

    /// Register a model under a name
    pub fn add_model(
        &mut self,
        name: impl Into<String>,
        model: ModelHandle,
    ) -> Result<ModelHandle, SceneError> {
        let name = name.into();
        if self.models.contains_key(&name) {
            return Err(SceneError::DuplicateModel(name));
        }
        self.models.insert(name, model);
        Ok(model)
    }

    /// Get a node as a port handle
    pub fn node(&self, name: &str) -> Option<SharedNode> {
        self.memory_node(name).map(|n| n.clone() as SharedNode)
    }

    /// Get a node with its concrete type
    pub fn memory_node(&self, name: &str) -> Option<&Arc<RwLock<MemoryNode>>> {
        self.node_index.get(name).map(|&i| &self.nodes[i])
    }

    /// Get a model by name
    pub fn model(&self, name: &str) -> Option<ModelHandle> {
        self.models.get(name).copied()
    }

    /// Reverse lookup of a model's name
    pub fn model_name(&self, model: ModelHandle) -> Option<&str> {
        self.models
            .iter()
            .find(|(_, m)| **m == model)
            .map(|(name, _)| name.as_str())
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Arc<RwLock<MemoryNode>>> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_lookup_nodes() {
        let mut scene = MemoryScene::new();
        scene.add_node(MemoryNode::new("wheel")).unwrap();
        scene
            .add_node(MemoryNode::new("spoiler").with_visible(false))
            .unwrap();

        assert_eq!(scene.len(), 2);
        assert!(!scene.node("spoiler").unwrap().read().is_visible());
        assert!(scene.node("roof").is_none());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut scene = MemoryScene::new();
        scene.add_node(MemoryNode::new("wheel")).unwrap();

        assert!(matches!(
            scene.add_node(MemoryNode::new("wheel")),
            Err(SceneError::DuplicateNode(name)) if name == "wheel"
        ));

        let model = ModelHandle::new();
        scene.add_model("rim", model).unwrap();
        assert!(scene.add_model("rim", ModelHandle::new()).is_err());
        assert_eq!(scene.model_name(model), Some("rim"));
    }

    #[test]
    fn test_shared_handle_writes_through() {
        let mut scene = MemoryScene::new();
        let shared = scene.add_node(MemoryNode::new("door")).unwrap();

        shared.write().set_visible(false);
        assert!(!scene.memory_node("door").unwrap().read().visible);
    }

    #[test]
    fn test_model_swap_clears_stale_mapping() {
        let first = ModelHandle::new();
        let mut node = MemoryNode::new("body")
            .with_model(first)
            .with_material_mapping([(0, 1)].into_iter().collect());

        node.set_model(Some(first));
        assert!(node.material_mapping().is_some());

        node.set_model(Some(ModelHandle::new()));
        assert!(node.material_mapping().is_none());
    }
}
