//! Scene and variant set descriptions.
//!
//! A [`SceneDescriptor`] names models, nodes and variant sets in RON or JSON
//! and is resolved by [`SceneDescriptor::build`] into a [`MemoryScene`] plus a
//! ready [`VariantSetManager`]. Variants reference nodes and models by name.
//!
//! ```ron
//! (
//!     models: [(name: "standard"), (name: "sport")],
//!     nodes: [(name: "body", model: "standard")],
//!     variant_sets: [(
//!         name: "Package",
//!         variants: [
//!             (name: "Standard", default: true, nodes: [(node: "body", model: "standard")]),
//!             (name: "Sport", nodes: [(node: "body", model: "sport")]),
//!         ],
//!     )],
//! )
//! ```

use ron::extensions::Extensions;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::node::{MaterialMapping, ModelHandle};
use crate::scene::{MemoryNode, MemoryScene, SceneError};
use crate::variant::{
    NodeProperties, Variant, VariantError, VariantNode, VariantSet, VariantSetManager,
};

/// Errors raised while parsing or resolving a descriptor
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DescriptorError {
    #[error("Failed to parse RON: {0}")]
    Ron(String),

    #[error("Failed to parse JSON: {0}")]
    Json(String),

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error("Variant '{variant}' references unknown node '{node}'")]
    UnknownNode { variant: String, node: String },

    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error(transparent)]
    Variant(#[from] VariantError),
}

/// A loadable model asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub name: String,
    /// Fixed asset id; a fresh one is generated when absent
    #[serde(default)]
    pub id: Option<Uuid>,
}

/// Initial state of a scene node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    pub name: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub material_mapping: Option<MaterialMapping>,
}

fn default_visible() -> bool {
    true
}

/// Properties a variant sets on one named node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantNodeDescriptor {
    pub node: String,
    #[serde(default)]
    pub visible: Option<bool>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub material_mapping: Option<MaterialMapping>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantDescriptor {
    pub name: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub default: bool,
    #[serde(default)]
    pub nodes: Vec<VariantNodeDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantSetDescriptor {
    pub name: String,
    pub variants: Vec<VariantDescriptor>,
}

/// Complete description of a configurable scene
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneDescriptor {
    #[serde(default)]
    pub models: Vec<ModelDescriptor>,
    #[serde(default)]
    pub nodes: Vec<NodeDescriptor>,
    #[serde(default)]
    pub variant_sets: Vec<VariantSetDescriptor>,
}

/// Options for [`SceneDescriptor::build`]
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    /// Reject variant sets with more than one default variant
    pub strict_defaults: bool,
}

/// A resolved scene and the manager driving its variants
pub struct LoadedScene {
    pub scene: MemoryScene,
    pub manager: VariantSetManager,
}

impl SceneDescriptor {
    /// Parse RON; optional fields may be written without `Some(...)`
    pub fn from_ron_str(s: &str) -> Result<Self, DescriptorError> {
        ron::Options::default()
            .with_default_extension(Extensions::IMPLICIT_SOME)
            .from_str(s)
            .map_err(|e| DescriptorError::Ron(e.to_string()))
    }

    pub fn from_json_str(s: &str) -> Result<Self, DescriptorError> {
        serde_json::from_str(s).map_err(|e| DescriptorError::Json(e.to_string()))
    }

    pub fn to_ron_string(&self) -> Result<String, DescriptorError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| DescriptorError::Ron(e.to_string()))
    }

    /// Create the nodes, then the variants in declaration order.
    ///
    /// Default variants are activated as they are constructed.
    pub fn build(&self, options: BuildOptions) -> Result<LoadedScene, DescriptorError> {
        let mut scene = MemoryScene::new();

        for model in &self.models {
            let handle = model
                .id
                .map(ModelHandle::from_uuid)
                .unwrap_or_else(ModelHandle::new);
            scene.add_model(model.name.clone(), handle)?;
        }

        for node in &self.nodes {
            let mut memory_node = MemoryNode::new(node.name.clone()).with_visible(node.visible);
            if let Some(model) = &node.model {
                memory_node = memory_node.with_model(resolve_model(&scene, model)?);
            }
            if let Some(mapping) = &node.material_mapping {
                memory_node = memory_node.with_material_mapping(mapping.clone());
            }
            scene.add_node(memory_node)?;
        }

        let mut variant_sets = Vec::with_capacity(self.variant_sets.len());
        for set in &self.variant_sets {
            let mut variants = Vec::with_capacity(set.variants.len());
            for variant in &set.variants {
                variants.push(build_variant(&scene, variant)?);
            }
            variant_sets.push(VariantSet::new(set.name.clone(), variants));
        }

        let manager = if options.strict_defaults {
            VariantSetManager::new_strict(variant_sets)?
        } else {
            VariantSetManager::new(variant_sets)
        };

        tracing::info!(
            nodes = scene.len(),
            variant_sets = manager.len(),
            "Built scene from descriptor"
        );

        Ok(LoadedScene { scene, manager })
    }
}

fn resolve_model(scene: &MemoryScene, name: &str) -> Result<ModelHandle, DescriptorError> {
    scene
        .model(name)
        .ok_or_else(|| DescriptorError::UnknownModel(name.to_string()))
}

fn build_variant(
    scene: &MemoryScene,
    variant: &VariantDescriptor,
) -> Result<Variant, DescriptorError> {
    let mut variant_nodes = Vec::with_capacity(variant.nodes.len());

    for target in &variant.nodes {
        let node = scene
            .node(&target.node)
            .ok_or_else(|| DescriptorError::UnknownNode {
                variant: variant.name.clone(),
                node: target.node.clone(),
            })?;
        let model = target
            .model
            .as_deref()
            .map(|name| resolve_model(scene, name))
            .transpose()?;

        let properties = NodeProperties {
            visible: target.visible,
            material_mapping: target.material_mapping.clone(),
            model,
        };
        variant_nodes.push(VariantNode::new(node, properties));
    }

    Ok(Variant::new(
        variant.name.clone(),
        variant.thumbnail.clone(),
        variant.default,
        variant_nodes,
    ))
}
