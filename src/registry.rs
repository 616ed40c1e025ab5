//! Explicit registry of measurement components.
//!
//! A [`ComponentRegistry`] is built by the caller and handed to a
//! [`Session`](crate::Session); nothing is registered globally. Disabling a
//! primary also silences every component derived from it.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::measurement::{Component, CpuClock, CycleCounter, WallClock};
use crate::normalized::Normalized;

/// Registry entry for one component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentInfo {
    /// Unique label.
    pub label: String,
    /// Free-text description.
    pub description: String,
    /// Label of the primary this component derives from.
    pub derived_from: Option<String>,
    /// Whether the component was enabled by the caller.
    pub enabled: bool,
}

impl ComponentInfo {
    /// Enabled entry describing `C`.
    pub fn of<C: Component>() -> Self {
        Self {
            label: C::label(),
            description: C::description(),
            derived_from: C::derived_from(),
            enabled: true,
        }
    }
}

/// Ordered set of registered components.
#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    entries: Vec<ComponentInfo>,
}

impl ComponentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the three primaries and their normalized forms.
    pub fn with_defaults() -> Self {
        Self {
            entries: vec![
                ComponentInfo::of::<WallClock>(),
                ComponentInfo::of::<Normalized<WallClock>>(),
                ComponentInfo::of::<CpuClock>(),
                ComponentInfo::of::<Normalized<CpuClock>>(),
                ComponentInfo::of::<CycleCounter>(),
                ComponentInfo::of::<Normalized<CycleCounter>>(),
            ],
        }
    }

    /// Register component `C`, enabled.
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateComponent`] if the label is already registered.
    pub fn register<C: Component>(&mut self) -> Result<&mut Self> {
        let label = C::label();
        if self.find(&label).is_some() {
            return Err(Error::DuplicateComponent(label));
        }
        self.entries.push(ComponentInfo::of::<C>());
        Ok(self)
    }

    /// Enable a registered component.
    pub fn enable(&mut self, label: &str) -> Result<()> {
        self.set_enabled(label, true)
    }

    /// Disable a registered component.
    pub fn disable(&mut self, label: &str) -> Result<()> {
        self.set_enabled(label, false)
    }

    /// Enable exactly the given labels and disable everything else.
    ///
    /// Validates all labels before changing anything.
    pub fn restrict_to<S: AsRef<str>>(&mut self, labels: &[S]) -> Result<()> {
        for label in labels {
            if self.find(label.as_ref()).is_none() {
                return Err(Error::UnknownComponent(label.as_ref().to_string()));
            }
        }
        for entry in &mut self.entries {
            entry.enabled = labels.iter().any(|l| l.as_ref() == entry.label);
        }
        Ok(())
    }

    /// Whether `label` is registered and enabled.
    pub fn is_enabled(&self, label: &str) -> bool {
        self.find(label).map(|e| e.enabled).unwrap_or(false)
    }

    /// Whether `label` is enabled and, if derived, its primary is active too.
    pub fn is_active(&self, label: &str) -> bool {
        match self.find(label) {
            Some(entry) if entry.enabled => match &entry.derived_from {
                Some(primary) => self.is_active(primary),
                None => true,
            },
            _ => false,
        }
    }

    /// Whether component `C` is active.
    pub fn is_active_for<C: Component>(&self) -> bool {
        self.is_active(&C::label())
    }

    /// Look up an entry.
    pub fn get(&self, label: &str) -> Option<&ComponentInfo> {
        self.find(label)
    }

    /// Entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ComponentInfo> {
        self.entries.iter()
    }

    /// Number of registered components.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn find(&self, label: &str) -> Option<&ComponentInfo> {
        self.entries.iter().find(|e| e.label == label)
    }

    fn set_enabled(&mut self, label: &str, enabled: bool) -> Result<()> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.label == label)
            .ok_or_else(|| Error::UnknownComponent(label.to_string()))?;
        entry.enabled = enabled;
        Ok(())
    }
}
