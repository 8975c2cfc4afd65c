//! Variant Configuration Core
//!
//! This crate contains the configuration engine behind the model viewer:
//! - Field / FieldManager: ordered configurable dimensions
//! - Configurator: command-driven selection state with change callbacks
//! - SceneNode: the port through which scene nodes are read and written
//! - Variant / VariantSet: property mutations grouped into dimensions
//! - VariantSetManager: activation with observed-state re-derivation
//! - Descriptor: RON/JSON scene and variant set descriptions

pub mod configurator;
pub mod descriptor;
pub mod field;
pub mod node;
pub mod scene;
pub mod subscribers;
pub mod variant;

pub use configurator::*;
pub use descriptor::*;
pub use field::*;
pub use node::*;
pub use scene::*;
pub use subscribers::*;
pub use variant::*;
