//! Scene node port.
//!
//! Variants never own scene nodes. They hold [`SharedNode`] handles into a
//! scene graph owned elsewhere (the renderer, or [`crate::scene::MemoryScene`]
//! in headless use) and talk to it only through [`SceneNode`].

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity handle of a loaded model asset.
///
/// Two handles are equal only if they refer to the same loaded asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModelHandle(Uuid);

impl ModelHandle {
    /// Creates a handle for a newly loaded asset.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a handle from a known asset id.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the asset id.
    pub fn id(&self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mapping from a model's material slot to a material index.
pub type MaterialMapping = BTreeMap<u32, u32>;

/// Shared, externally owned scene node.
pub type SharedNode = Arc<RwLock<dyn SceneNode>>;

/// Wraps a concrete node into a [`SharedNode`].
pub fn share_node<N: SceneNode + 'static>(node: N) -> SharedNode {
    Arc::new(RwLock::new(node))
}

/// Capabilities a scene node must expose to be driven by variants.
pub trait SceneNode: Send + Sync {
    /// Name of the node, used in logs and lookups.
    fn name(&self) -> &str;

    /// Returns whether the node is enabled/visible.
    fn is_visible(&self) -> bool;

    /// Enables or disables the node.
    fn set_visible(&mut self, visible: bool);

    /// Returns the model currently installed on the node.
    fn model(&self) -> Option<ModelHandle>;

    /// Installs a model on the node.
    fn set_model(&mut self, model: Option<ModelHandle>);

    /// Returns the current slot → material mapping, if any was applied.
    fn material_mapping(&self) -> Option<&MaterialMapping>;

    /// Applies a slot → material mapping to the installed model.
    fn set_material_mapping(&mut self, mapping: MaterialMapping);

    /// Called after a variant has written to the node.
    ///
    /// Renderer adapters reapply lightmaps and similar per-model
    /// decorations here.
    fn reapply_decorations(&mut self) {}
}
