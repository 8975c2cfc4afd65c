//! Command-driven configuration over a [`FieldManager`].
//!
//! A [`Configurator`] stores the selected value of each field and notifies
//! per-field subscribers when [`Configurator::set_value`] is called. Nothing
//! is derived here: the selection is exactly the last accepted command.

use std::sync::Arc;

use crate::field::{FieldId, FieldManager, ValueId};
use crate::subscribers::{CallbackList, DedupPolicy};

/// Callback invoked with the newly selected value id of a field
pub type ValueChangeCallback = Arc<dyn Fn(ValueId) + Send + Sync>;

/// Errors returned by configurator commands
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfiguratorError {
    #[error("Invalid field id: {0}")]
    InvalidFieldId(FieldId),

    #[error("Invalid value id {value_id} for field {field_id}")]
    InvalidValueId { field_id: FieldId, value_id: ValueId },
}

/// Mutable selection state for every field of a shared [`FieldManager`]
pub struct Configurator<M, V> {
    manager: Arc<FieldManager<M, V>>,
    configuration: Vec<ValueId>,
    subscribers: Vec<CallbackList<dyn Fn(ValueId) + Send + Sync>>,
}

impl<M, V> Configurator<M, V> {
    /// Create a configurator with every field at its default value
    pub fn new(manager: Arc<FieldManager<M, V>>) -> Self {
        let configuration: Vec<ValueId> =
            manager.fields().iter().map(|f| f.default_value()).collect();
        let subscribers = (0..configuration.len())
            .map(|_| CallbackList::new(DedupPolicy::Multiset))
            .collect();

        Self {
            manager,
            configuration,
            subscribers,
        }
    }

    pub fn manager(&self) -> &Arc<FieldManager<M, V>> {
        &self.manager
    }

    /// Current selection of every field, indexed by field id
    pub fn configuration(&self) -> &[ValueId] {
        &self.configuration
    }

    /// Selected value id of a field
    pub fn value(&self, field_id: FieldId) -> Option<ValueId> {
        self.configuration.get(field_id).copied()
    }

    /// Selected value of a field, resolved through the field manager
    pub fn value_data(&self, field_id: FieldId) -> Option<&V> {
        let value_id = self.value(field_id)?;
        self.manager.value(field_id, value_id)
    }

    /// Select a value and notify the field's subscribers
    ///
    /// The configuration is left untouched on error.
    pub fn set_value(
        &mut self,
        field_id: FieldId,
        value_id: ValueId,
    ) -> Result<(), ConfiguratorError> {
        if field_id >= self.configuration.len() {
            return Err(ConfiguratorError::InvalidFieldId(field_id));
        }
        if self.manager.value(field_id, value_id).is_none() {
            return Err(ConfiguratorError::InvalidValueId { field_id, value_id });
        }

        self.configuration[field_id] = value_id;
        tracing::debug!(field_id, value_id, "Configurator value set");

        for callback in self.subscribers[field_id].iter() {
            callback(value_id);
        }

        Ok(())
    }

    /// Subscribe to value changes of a field
    ///
    /// Registrations are not deduplicated: the same callback registered twice
    /// is called twice per change.
    pub fn on_value_change(
        &mut self,
        field_id: FieldId,
        callback: ValueChangeCallback,
    ) -> Result<(), ConfiguratorError> {
        let list = self
            .subscribers
            .get_mut(field_id)
            .ok_or(ConfiguratorError::InvalidFieldId(field_id))?;
        list.register(callback);
        Ok(())
    }

    /// Remove one registration of `callback`; absent callbacks are ignored
    pub fn off_value_change(
        &mut self,
        field_id: FieldId,
        callback: &ValueChangeCallback,
    ) -> Result<(), ConfiguratorError> {
        let list = self
            .subscribers
            .get_mut(field_id)
            .ok_or(ConfiguratorError::InvalidFieldId(field_id))?;
        list.unregister(callback);
        Ok(())
    }
}
