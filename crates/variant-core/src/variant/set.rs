//! Variant set: one named configuration dimension

use super::{Variant, VariantError, VariantId};

/// Named, ordered collection of variants
#[derive(Debug, Clone)]
pub struct VariantSet {
    name: String,
    variants: Vec<Variant>,
}

impl VariantSet {
    /// Create a variant set. Membership is fixed from here on.
    pub fn new(name: impl Into<String>, variants: Vec<Variant>) -> Self {
        Self {
            name: name.into(),
            variants,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    pub fn variant(&self, variant_id: VariantId) -> Option<&Variant> {
        self.variants.get(variant_id)
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// Find a variant by name
    pub fn find_variant(&self, name: &str) -> Option<VariantId> {
        self.variants.iter().position(|v| v.name() == name)
    }

    /// Ids of variants whose properties are currently observed, ascending
    pub fn active_variant_ids(&self) -> Vec<VariantId> {
        self.variants
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_active())
            .map(|(id, _)| id)
            .collect()
    }

    /// Ids of variants marked active by default
    pub fn default_variant_ids(&self) -> Vec<VariantId> {
        self.variants
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_active_by_default())
            .map(|(id, _)| id)
            .collect()
    }

    /// Check that at most one variant is marked as default
    pub fn validate(&self) -> Result<(), VariantError> {
        let defaults = self.default_variant_ids();
        if defaults.len() > 1 {
            return Err(VariantError::MultipleDefaults {
                variant_set: self.name.clone(),
                variants: defaults
                    .into_iter()
                    .map(|id| self.variants[id].name().to_string())
                    .collect(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::share_node;
    use crate::scene::MemoryNode;
    use crate::variant::{NodeProperties, VariantNode};

    fn paint_set(defaults: [bool; 3]) -> VariantSet {
        let body = share_node(MemoryNode::new("body"));
        let variants = ["Red", "Blue", "Green"]
            .into_iter()
            .zip(defaults)
            .enumerate()
            .map(|(slot, (name, is_default))| {
                let mapping = [(0, slot as u32)].into_iter().collect();
                Variant::new(
                    name,
                    None,
                    is_default,
                    vec![VariantNode::new(
                        body.clone(),
                        NodeProperties::material_mapping(mapping),
                    )],
                )
            })
            .collect();
        VariantSet::new("Paint", variants)
    }

    #[test]
    fn test_lookup_by_name() {
        let set = paint_set([true, false, false]);

        assert_eq!(set.len(), 3);
        assert_eq!(set.find_variant("Blue"), Some(1));
        assert_eq!(set.find_variant("Purple"), None);
        assert!(set.variant(3).is_none());
    }

    #[test]
    fn test_active_ids_follow_scene() {
        let set = paint_set([true, false, false]);
        assert_eq!(set.active_variant_ids(), vec![0]);

        set.variants()[2].activate();
        assert_eq!(set.active_variant_ids(), vec![2]);
    }

    #[test]
    fn test_validate_multiple_defaults() {
        assert!(paint_set([true, false, false]).validate().is_ok());
        assert!(paint_set([false, false, false]).validate().is_ok());

        let set = paint_set([true, false, true]);
        assert_eq!(
            set.validate(),
            Err(VariantError::MultipleDefaults {
                variant_set: "Paint".into(),
                variants: vec!["Red".into(), "Green".into()],
            })
        );
        // Green was constructed last
        assert_eq!(set.active_variant_ids(), vec![2]);
    }
}
