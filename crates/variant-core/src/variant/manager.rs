//! Variant set manager.
//!
//! Activating a variant writes node properties that other variant sets may
//! also inspect, so after every activation the manager re-derives the
//! observed state of *all* sets, diffs it against the previous state and
//! notifies only the sets that changed. Global subscribers are notified once
//! per activation, whether or not anything changed.
//!
//! Subscribers run synchronously while the manager is mutably borrowed, so a
//! subscriber cannot call [`VariantSetManager::activate`] on the same manager
//! from inside its callback. Nested activation is not supported: a subscriber
//! that wants to activate another variant queues the request, and the caller
//! issues it after `activate` returns. Each queued activation then runs its
//! own full derivation and notification round.

use std::sync::Arc;

use crate::subscribers::{CallbackList, DedupPolicy};

use super::{VariantError, VariantId, VariantSet, VariantSetId};

/// Observed active variant ids of every set, indexed by variant set id
pub type GlobalState = Vec<Vec<VariantId>>;

/// Callback invoked with the new observed state of one variant set
pub type StateChangeCallback = Arc<dyn Fn(&[VariantId]) + Send + Sync>;

/// Callback invoked with the full observed state after an activation
pub type GlobalStateChangeCallback = Arc<dyn Fn(&[Vec<VariantId>]) + Send + Sync>;

type StateSubscribers = CallbackList<dyn Fn(&[VariantId]) + Send + Sync>;
type GlobalSubscribers = CallbackList<dyn Fn(&[Vec<VariantId>]) + Send + Sync>;

/// Orchestrates activation and change notification across variant sets
pub struct VariantSetManager {
    variant_sets: Vec<VariantSet>,
    global_state: GlobalState,
    state_subscribers: Vec<StateSubscribers>,
    global_subscribers: GlobalSubscribers,
}

impl VariantSetManager {
    /// Take ownership of the variant sets and derive their initial state
    pub fn new(variant_sets: Vec<VariantSet>) -> Self {
        for set in &variant_sets {
            if let Err(e) = set.validate() {
                tracing::warn!("{}", e);
            }
        }

        let global_state = derive_state(&variant_sets);
        let state_subscribers = (0..variant_sets.len())
            .map(|_| CallbackList::new(DedupPolicy::Unique))
            .collect();

        tracing::debug!(
            variant_sets = variant_sets.len(),
            state = ?global_state,
            "Created variant set manager"
        );

        Self {
            variant_sets,
            global_state,
            state_subscribers,
            global_subscribers: CallbackList::new(DedupPolicy::Unique),
        }
    }

    /// Like [`VariantSetManager::new`], but rejects sets with several defaults
    pub fn new_strict(variant_sets: Vec<VariantSet>) -> Result<Self, VariantError> {
        for set in &variant_sets {
            set.validate()?;
        }
        Ok(Self::new(variant_sets))
    }

    // ============== Activation ==============

    /// Activate a variant and propagate the observed state changes.
    ///
    /// Returns the ids of the variant sets whose observed state changed,
    /// which may include sets other than `variant_set_id`.
    pub fn activate(
        &mut self,
        variant_set_id: VariantSetId,
        variant_id: VariantId,
    ) -> Result<Vec<VariantSetId>, VariantError> {
        if variant_set_id >= self.global_state.len() {
            return Err(VariantError::InvalidVariantSetId(variant_set_id));
        }

        let variant = self.variant_sets[variant_set_id]
            .variant(variant_id)
            .ok_or(VariantError::InvalidVariantId {
                variant_set_id,
                variant_id,
            })?;

        tracing::debug!(
            variant_set = self.variant_sets[variant_set_id].name(),
            variant = variant.name(),
            "Activate"
        );
        variant.activate();

        Ok(self.propagate())
    }

    /// Activate a variant addressed by set and variant names
    pub fn activate_by_name(
        &mut self,
        variant_set: &str,
        variant: &str,
    ) -> Result<(VariantSetId, VariantId), VariantError> {
        let variant_set_id = self
            .find_variant_set(variant_set)
            .ok_or_else(|| VariantError::UnknownVariantSet(variant_set.to_string()))?;
        let variant_id = self.find_variant(variant_set_id, variant).ok_or_else(|| {
            VariantError::UnknownVariant {
                variant_set: variant_set.to_string(),
                variant: variant.to_string(),
            }
        })?;

        self.activate(variant_set_id, variant_id)?;
        Ok((variant_set_id, variant_id))
    }

    /// Re-derive the observed state after the scene was changed from outside.
    ///
    /// Notifies exactly like [`VariantSetManager::activate`] and returns the
    /// changed variant set ids.
    pub fn refresh(&mut self) -> Vec<VariantSetId> {
        self.propagate()
    }

    fn propagate(&mut self) -> Vec<VariantSetId> {
        let new_state = derive_state(&self.variant_sets);

        let changed: Vec<VariantSetId> = new_state
            .iter()
            .zip(&self.global_state)
            .enumerate()
            .filter(|(_, (new, old))| new != old)
            .map(|(id, _)| id)
            .collect();

        for &id in &changed {
            tracing::debug!(
                variant_set = self.variant_sets[id].name(),
                from = ?self.global_state[id],
                to = ?new_state[id],
                "Variant set state changed"
            );
            for callback in self.state_subscribers[id].iter() {
                callback(new_state[id].as_slice());
            }
        }

        self.global_state = new_state;

        for callback in self.global_subscribers.iter() {
            callback(self.global_state.as_slice());
        }

        changed
    }

    // ============== Subscriptions ==============

    /// Subscribe to observed state changes of one variant set.
    ///
    /// Registering the same callback twice has no effect.
    pub fn on_state_change(
        &mut self,
        variant_set_id: VariantSetId,
        callback: StateChangeCallback,
    ) -> Result<(), VariantError> {
        self.state_subscribers
            .get_mut(variant_set_id)
            .ok_or(VariantError::InvalidVariantSetId(variant_set_id))?
            .register(callback);
        Ok(())
    }

    /// Unsubscribe from one variant set; unknown callbacks are ignored
    pub fn off_state_change(
        &mut self,
        variant_set_id: VariantSetId,
        callback: &StateChangeCallback,
    ) -> Result<(), VariantError> {
        self.state_subscribers
            .get_mut(variant_set_id)
            .ok_or(VariantError::InvalidVariantSetId(variant_set_id))?
            .unregister(callback);
        Ok(())
    }

    /// Subscribe to the full state, called once per activation
    pub fn on_global_state_change(&mut self, callback: GlobalStateChangeCallback) {
        self.global_subscribers.register(callback);
    }

    pub fn off_global_state_change(&mut self, callback: &GlobalStateChangeCallback) {
        self.global_subscribers.unregister(callback);
    }

    // ============== Queries ==============

    pub fn variant_sets(&self) -> &[VariantSet] {
        &self.variant_sets
    }

    pub fn variant_set(&self, variant_set_id: VariantSetId) -> Option<&VariantSet> {
        self.variant_sets.get(variant_set_id)
    }

    pub fn len(&self) -> usize {
        self.variant_sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variant_sets.is_empty()
    }

    /// Name of a variant set
    pub fn name(&self, variant_set_id: VariantSetId) -> Option<&str> {
        self.variant_set(variant_set_id).map(VariantSet::name)
    }

    /// Ids of all variants of a set; empty for an unknown set
    pub fn variant_ids(&self, variant_set_id: VariantSetId) -> Vec<VariantId> {
        self.variant_set(variant_set_id)
            .map(|set| (0..set.len()).collect())
            .unwrap_or_default()
    }

    /// Names of all variants of a set; empty for an unknown set
    pub fn variant_names(&self, variant_set_id: VariantSetId) -> Vec<&str> {
        self.variant_set(variant_set_id)
            .map(|set| set.variants().iter().map(|v| v.name()).collect())
            .unwrap_or_default()
    }

    /// Thumbnail sources of all variants of a set; empty for an unknown set
    pub fn variant_thumbnails(&self, variant_set_id: VariantSetId) -> Vec<Option<&str>> {
        self.variant_set(variant_set_id)
            .map(|set| set.variants().iter().map(|v| v.thumbnail_source()).collect())
            .unwrap_or_default()
    }

    /// Observed active variant ids of a set, as of the last derivation
    pub fn state(&self, variant_set_id: VariantSetId) -> Option<&[VariantId]> {
        self.global_state.get(variant_set_id).map(Vec::as_slice)
    }

    /// Observed active variant ids of every set, as of the last derivation
    pub fn global_state(&self) -> &[Vec<VariantId>] {
        &self.global_state
    }

    pub fn find_variant_set(&self, name: &str) -> Option<VariantSetId> {
        self.variant_sets.iter().position(|s| s.name() == name)
    }

    pub fn find_variant(&self, variant_set_id: VariantSetId, name: &str) -> Option<VariantId> {
        self.variant_set(variant_set_id)?.find_variant(name)
    }
}

impl std::fmt::Debug for VariantSetManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VariantSetManager")
            .field("variant_sets", &self.variant_sets.len())
            .field("global_state", &self.global_state)
            .finish()
    }
}

/// Evaluate every variant of every set against the live scene
fn derive_state(variant_sets: &[VariantSet]) -> GlobalState {
    variant_sets
        .iter()
        .map(VariantSet::active_variant_ids)
        .collect()
}
