//! Variants and variant sets.
//!
//! A [`Variant`] is one selectable option of a configuration dimension. It
//! owns the property values it wants on a list of shared scene nodes and
//! reports whether those values are currently observed on the live nodes.

mod manager;
mod set;

pub use manager::*;
pub use set::*;

use serde::{Deserialize, Serialize};

use crate::node::{MaterialMapping, ModelHandle, SceneNode, SharedNode};

/// Index of a variant inside its [`VariantSet`]
pub type VariantId = usize;

/// Index of a variant set inside a [`VariantSetManager`]
pub type VariantSetId = usize;

/// Variant-related errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VariantError {
    #[error("Invalid variant set id: {0}")]
    InvalidVariantSetId(VariantSetId),

    #[error("Invalid variant id {variant_id} in variant set {variant_set_id}")]
    InvalidVariantId {
        variant_set_id: VariantSetId,
        variant_id: VariantId,
    },

    #[error("Variant set not found: {0}")]
    UnknownVariantSet(String),

    #[error("Variant '{variant}' not found in variant set '{variant_set}'")]
    UnknownVariant { variant_set: String, variant: String },

    #[error("Variant set '{variant_set}' has several default variants: {variants:?}")]
    MultipleDefaults {
        variant_set: String,
        variants: Vec<String>,
    },
}

/// Property values a variant wants on one node; `None` leaves a property alone
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_mapping: Option<MaterialMapping>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelHandle>,
}

impl NodeProperties {
    pub fn visible(visible: bool) -> Self {
        Self {
            visible: Some(visible),
            ..Default::default()
        }
    }

    pub fn model(model: ModelHandle) -> Self {
        Self {
            model: Some(model),
            ..Default::default()
        }
    }

    pub fn material_mapping(mapping: MaterialMapping) -> Self {
        Self {
            material_mapping: Some(mapping),
            ..Default::default()
        }
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = Some(visible);
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

    /// True if no property is defined
    pub fn is_empty(&self) -> bool {
        self.visible.is_none() && self.material_mapping.is_none() && self.model.is_none()
    }

    /// Check every defined property against a live node
    pub fn matches(&self, node: &dyn SceneNode) -> bool {
        self.visible.is_none_or(|v| node.is_visible() == v)
            && self.model.is_none_or(|m| node.model() == Some(m))
            && self
                .material_mapping
                .as_ref()
                .is_none_or(|m| node.material_mapping() == Some(m))
    }

    /// Write every defined property to a node.
    ///
    /// The model goes first since material slots refer to the installed
    /// model, then visibility, then the material mapping.
    pub fn apply(&self, node: &mut dyn SceneNode) {
        if let Some(model) = self.model {
            node.set_model(Some(model));
        }
        if let Some(visible) = self.visible {
            node.set_visible(visible);
        }
        if let Some(mapping) = &self.material_mapping {
            node.set_material_mapping(mapping.clone());
        }
    }
}

/// A target node together with the properties a variant wants on it
#[derive(Clone)]
pub struct VariantNode {
    pub node: SharedNode,
    pub properties: NodeProperties,
}

impl VariantNode {
    pub fn new(node: SharedNode, properties: NodeProperties) -> Self {
        Self { node, properties }
    }

    fn apply(&self) {
        if self.properties.is_empty() {
            return;
        }

        let mut node = self.node.write();
        self.properties.apply(&mut *node);
        node.reapply_decorations();
        tracing::trace!(node = node.name(), properties = ?self.properties, "Applied variant node");
    }

    fn is_observed(&self) -> bool {
        self.properties.matches(&*self.node.read())
    }
}

impl std::fmt::Debug for VariantNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The caller may hold the node's write lock
        let node = self.node.try_read();
        f.debug_struct("VariantNode")
            .field("node", &node.as_ref().map_or("<locked>", |node| node.name()))
            .field("properties", &self.properties)
            .finish()
    }
}

/// One selectable option of a variant set
#[derive(Debug, Clone)]
pub struct Variant {
    name: String,
    thumbnail_source: Option<String>,
    is_active_by_default: bool,
    variant_nodes: Vec<VariantNode>,
}

impl Variant {
    /// Create a variant.
    ///
    /// A variant marked active by default is activated immediately, so when
    /// several defaults touch the same nodes the last one constructed wins.
    pub fn new(
        name: impl Into<String>,
        thumbnail_source: Option<String>,
        is_active_by_default: bool,
        variant_nodes: Vec<VariantNode>,
    ) -> Self {
        let variant = Self {
            name: name.into(),
            thumbnail_source,
            is_active_by_default,
            variant_nodes,
        };

        if variant.is_active_by_default {
            variant.activate();
        }

        variant
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn thumbnail_source(&self) -> Option<&str> {
        self.thumbnail_source.as_deref()
    }

    pub fn is_active_by_default(&self) -> bool {
        self.is_active_by_default
    }

    pub fn variant_nodes(&self) -> &[VariantNode] {
        &self.variant_nodes
    }

    /// Write this variant's properties to its nodes
    pub fn activate(&self) {
        tracing::debug!(
            variant = %self.name,
            nodes = self.variant_nodes.len(),
            "Activating variant"
        );
        for variant_node in &self.variant_nodes {
            variant_node.apply();
        }
    }

    /// Whether every node currently shows this variant's properties.
    ///
    /// Evaluated against the live nodes on every call.
    pub fn is_active(&self) -> bool {
        self.variant_nodes.iter().all(VariantNode::is_observed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{MaterialMapping, share_node};
    use crate::scene::MemoryNode;
    use parking_lot::{Mutex, RwLock};
    use std::sync::Arc;

    /// Node that records the order of writes
    struct RecordingNode {
        inner: MemoryNode,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl SceneNode for RecordingNode {
        fn name(&self) -> &str {
            self.inner.name()
        }
        fn is_visible(&self) -> bool {
            self.inner.is_visible()
        }
        fn set_visible(&mut self, visible: bool) {
            self.log.lock().push("visible");
            self.inner.set_visible(visible);
        }
        fn model(&self) -> Option<ModelHandle> {
            self.inner.model()
        }
        fn set_model(&mut self, model: Option<ModelHandle>) {
            self.log.lock().push("model");
            self.inner.set_model(model);
        }
        fn material_mapping(&self) -> Option<&MaterialMapping> {
            self.inner.material_mapping()
        }
        fn set_material_mapping(&mut self, mapping: MaterialMapping) {
            self.log.lock().push("material_mapping");
            self.inner.set_material_mapping(mapping);
        }
        fn reapply_decorations(&mut self) {
            self.log.lock().push("decorations");
        }
    }

    fn mapping(pairs: &[(u32, u32)]) -> MaterialMapping {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_visibility_variant_becomes_active() {
        let node = share_node(MemoryNode::new("spoiler").with_visible(false));
        let variant = Variant::new(
            "Spoiler",
            None,
            false,
            vec![VariantNode::new(node.clone(), NodeProperties::visible(true))],
        );

        assert!(!variant.is_active());
        variant.activate();
        assert!(variant.is_active());
        assert!(node.read().is_visible());
    }

    #[test]
    fn test_active_is_not_cached() {
        let node = share_node(MemoryNode::new("spoiler"));
        let variant = Variant::new(
            "Spoiler",
            None,
            false,
            vec![VariantNode::new(node.clone(), NodeProperties::visible(true))],
        );
        assert!(variant.is_active());

        node.write().set_visible(false);
        assert!(!variant.is_active());
    }

    #[test]
    fn test_default_variant_activates_on_construction() {
        let node = share_node(MemoryNode::new("roof").with_visible(false));
        let variant = Variant::new(
            "Open roof",
            Some("thumbs/open.png".into()),
            true,
            vec![VariantNode::new(node.clone(), NodeProperties::visible(true))],
        );

        assert!(node.read().is_visible());
        assert!(variant.is_active());
        assert_eq!(variant.thumbnail_source(), Some("thumbs/open.png"));
    }

    #[test]
    fn test_last_default_wins() {
        let node = share_node(MemoryNode::new("roof"));
        let closed = Variant::new(
            "Closed",
            None,
            true,
            vec![VariantNode::new(node.clone(), NodeProperties::visible(true))],
        );
        let open = Variant::new(
            "Open",
            None,
            true,
            vec![VariantNode::new(node.clone(), NodeProperties::visible(false))],
        );

        assert!(!closed.is_active());
        assert!(open.is_active());
    }

    #[test]
    fn test_write_order_and_decoration_hook() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let node: SharedNode = Arc::new(RwLock::new(RecordingNode {
            inner: MemoryNode::new("body"),
            log: log.clone(),
        }));
        let properties = NodeProperties::material_mapping(mapping(&[(0, 3)]))
            .with_visible(true)
            .with_model(ModelHandle::new());

        let variant = Variant::new("Sport", None, false, vec![VariantNode::new(node, properties)]);
        variant.activate();

        assert_eq!(
            *log.lock(),
            vec!["model", "visible", "material_mapping", "decorations"]
        );
        assert!(variant.is_active());
    }

    #[test]
    fn test_empty_properties_match_and_skip_writes() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let node: SharedNode = Arc::new(RwLock::new(RecordingNode {
            inner: MemoryNode::new("body"),
            log: log.clone(),
        }));
        let variant = Variant::new(
            "Nothing",
            None,
            false,
            vec![VariantNode::new(node, NodeProperties::default())],
        );

        assert!(variant.is_active());
        variant.activate();
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_model_and_mapping_comparison() {
        let standard = ModelHandle::new();
        let sport = ModelHandle::new();
        let node = share_node(
            MemoryNode::new("wheels")
                .with_model(standard)
                .with_material_mapping(mapping(&[(0, 1), (1, 2)])),
        );

        let same = NodeProperties::model(standard).with_material_mapping(mapping(&[(1, 2), (0, 1)]));
        let other_model = NodeProperties::model(sport);
        let other_mapping = NodeProperties::material_mapping(mapping(&[(0, 1)]));

        let guard = node.read();
        assert!(same.matches(&*guard));
        assert!(!other_model.matches(&*guard));
        assert!(!other_mapping.matches(&*guard));
    }

    #[test]
    fn test_variant_spanning_nodes_requires_all() {
        let left = share_node(MemoryNode::new("left_mirror").with_visible(false));
        let right = share_node(MemoryNode::new("right_mirror").with_visible(false));
        let variant = Variant::new(
            "Mirrors",
            None,
            false,
            vec![
                VariantNode::new(left.clone(), NodeProperties::visible(true)),
                VariantNode::new(right, NodeProperties::visible(true)),
            ],
        );

        left.write().set_visible(true);
        assert!(!variant.is_active());

        variant.activate();
        assert!(variant.is_active());
    }

    #[test]
    fn test_node_properties_ron_form() {
        let properties: NodeProperties = ron::from_str("(visible: Some(false))").unwrap();
        assert_eq!(properties, NodeProperties::visible(false));
    }

    #[test]
    fn test_debug_with_locked_node() {
        let node = share_node(MemoryNode::new("hood"));
        let variant_node = VariantNode::new(node.clone(), NodeProperties::visible(false));

        assert!(format!("{:?}", variant_node).contains("\"hood\""));

        let _guard = node.write();
        assert!(format!("{:?}", variant_node).contains("<locked>"));
    }
}
