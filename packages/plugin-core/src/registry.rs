use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::action::{ExecuteInput, ExecuteOutput, RestoreItemAction};
use crate::context::InvocationContext;
use crate::error::PluginError;

/// Public information about a registered action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionInfo {
    pub name: String,
    pub action: String,
    pub resources: Vec<String>,
}

struct ActionEntry {
    action: Arc<dyn RestoreItemAction>,
    resources: Vec<String>,
}

/// Maps registered names and resource strings to restore item actions.
///
/// A resource is served by at most one action.
#[derive(Default)]
pub struct ActionRegistry {
    actions: BTreeMap<String, ActionEntry>,
    by_resource: HashMap<String, String>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `action` under `name` for every resource it applies to.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        action: Arc<dyn RestoreItemAction>,
    ) -> Result<(), PluginError> {
        let name = name.into();
        if self.actions.contains_key(&name) {
            return Err(PluginError::AlreadyRegistered(name));
        }

        let resources = action.applies_to().included_resources;
        if let Some(taken) = resources.iter().find(|r| self.by_resource.contains_key(*r)) {
            return Err(PluginError::AlreadyRegistered(taken.clone()));
        }

        for resource in &resources {
            self.by_resource.insert(resource.clone(), name.clone());
        }
        debug!(name = %name, resources = ?resources, "Registered restore item action");
        self.actions.insert(name, ActionEntry { action, resources });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn RestoreItemAction>> {
        self.actions.get(name).map(|entry| Arc::clone(&entry.action))
    }

    pub fn for_resource(&self, resource: &str) -> Option<Arc<dyn RestoreItemAction>> {
        self.by_resource
            .get(resource)
            .and_then(|name| self.get(name))
    }

    pub fn infos(&self) -> Vec<ActionInfo> {
        self.actions
            .iter()
            .map(|(name, entry)| ActionInfo {
                name: name.clone(),
                action: entry.action.name().to_string(),
                resources: entry.resources.clone(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Dispatch `input` to the action serving `resource`.
    pub async fn execute(
        &self,
        resource: &str,
        ctx: &InvocationContext,
        input: ExecuteInput,
    ) -> Result<ExecuteOutput, PluginError> {
        let action = self
            .for_resource(resource)
            .ok_or_else(|| PluginError::NotFound(resource.to_string()))?;
        debug!(resource, action = action.name(), "Dispatching restore item");
        action.execute(ctx, input).await
    }
}
