use async_trait::async_trait;
use common::Restore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::InvocationContext;
use crate::error::PluginError;

/// Resources an action wants to be invoked for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSelector {
    #[serde(default)]
    pub included_resources: Vec<String>,
}

impl ResourceSelector {
    pub fn resources(resources: &[&str]) -> Self {
        Self {
            included_resources: resources.iter().map(|r| r.to_string()).collect(),
        }
    }
}

/// An item the orchestrator should restore along with the current one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceIdentifier {
    pub group_resource: String,
    #[serde(default)]
    pub namespace: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteInput {
    /// The item being restored, after earlier actions ran.
    pub item: Value,
    /// The item as it was captured in the backup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_from_backup: Option<Value>,
    pub restore: Restore,
}

impl ExecuteInput {
    pub fn new(item: Value, restore: Restore) -> Self {
        Self {
            item,
            item_from_backup: None,
            restore,
        }
    }

    /// Convert the untyped item into `T`.
    pub fn item_as<T: DeserializeOwned>(&self) -> Result<T, PluginError> {
        Ok(T::deserialize(&self.item)?)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_item: Option<Value>,
    #[serde(default)]
    pub additional_items: Vec<ResourceIdentifier>,
    /// Tells the orchestrator not to create the item at all.
    #[serde(default)]
    pub skip_restore: bool,
}

impl ExecuteOutput {
    pub fn skip() -> Self {
        Self {
            skip_restore: true,
            ..Self::default()
        }
    }

    pub fn updated<T: Serialize>(item: &T) -> Result<Self, PluginError> {
        Ok(Self {
            updated_item: Some(serde_json::to_value(item)?),
            ..Self::default()
        })
    }

    pub fn with_additional_items(mut self, items: Vec<ResourceIdentifier>) -> Self {
        self.additional_items = items;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationProgress {
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub items_completed: u64,
    pub items_total: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// A restore-time transform for one family of resources.
///
/// `execute` does all of its work before returning and never hands back an
/// operation ID, so the operation-tracking calls have nothing to track.
#[async_trait]
pub trait RestoreItemAction: Send + Sync {
    fn name(&self) -> &str;

    fn applies_to(&self) -> ResourceSelector;

    async fn execute(
        &self,
        ctx: &InvocationContext,
        input: ExecuteInput,
    ) -> Result<ExecuteOutput, PluginError>;

    fn progress(
        &self,
        operation_id: &str,
        _restore: &Restore,
    ) -> Result<OperationProgress, PluginError> {
        if operation_id.is_empty() {
            return Err(PluginError::InvalidOperationId(operation_id.to_string()));
        }
        Ok(OperationProgress {
            completed: true,
            ..OperationProgress::default()
        })
    }

    fn cancel(&self, _operation_id: &str, _restore: &Restore) -> Result<(), PluginError> {
        Ok(())
    }

    fn are_additional_items_ready(
        &self,
        _additional_items: &[ResourceIdentifier],
        _restore: &Restore,
    ) -> Result<bool, PluginError> {
        Ok(true)
    }
}
