use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::StoreError;
use crate::integrations::catalog;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationConfig {
    pub enabled: bool,
    pub config: Value,
    pub updated_at: DateTime<Utc>,
}

/// Key-value store of integration settings keyed by `(form_id, integration_id)`.
/// Un-versioned: concurrent writers silently overwrite each other.
#[async_trait]
pub trait IntegrationStore: Send + Sync {
    async fn get(
        &self,
        form_id: Uuid,
        integration_id: &str,
    ) -> Result<Option<IntegrationConfig>, StoreError>;

    /// Stores `config` and marks the integration enabled.
    async fn save(
        &self,
        form_id: Uuid,
        integration_id: &str,
        config: Value,
    ) -> Result<IntegrationConfig, StoreError>;

    /// Returns `None` when nothing has been saved for the pair yet.
    async fn set_enabled(
        &self,
        form_id: Uuid,
        integration_id: &str,
        enabled: bool,
    ) -> Result<Option<IntegrationConfig>, StoreError>;

    /// Every saved configuration of a form, keyed by integration id.
    async fn list_for_form(
        &self,
        form_id: Uuid,
    ) -> Result<HashMap<String, IntegrationConfig>, StoreError>;
}

fn form_prefix(form_id: Uuid) -> String {
    format!("integration:{form_id}:")
}

fn storage_key(form_id: Uuid, integration_id: &str) -> String {
    format!("{}{integration_id}", form_prefix(form_id))
}

fn enabled_config(config: Value) -> IntegrationConfig {
    IntegrationConfig {
        enabled: true,
        config,
        updated_at: Utc::now(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory backend
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryIntegrationStore {
    entries: RwLock<HashMap<String, IntegrationConfig>>,
}

impl MemoryIntegrationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IntegrationStore for MemoryIntegrationStore {
    async fn get(
        &self,
        form_id: Uuid,
        integration_id: &str,
    ) -> Result<Option<IntegrationConfig>, StoreError> {
        Ok(self
            .entries
            .read()
            .await
            .get(&storage_key(form_id, integration_id))
            .cloned())
    }

    async fn save(
        &self,
        form_id: Uuid,
        integration_id: &str,
        config: Value,
    ) -> Result<IntegrationConfig, StoreError> {
        let entry = enabled_config(config);
        self.entries
            .write()
            .await
            .insert(storage_key(form_id, integration_id), entry.clone());
        Ok(entry)
    }

    async fn set_enabled(
        &self,
        form_id: Uuid,
        integration_id: &str,
        enabled: bool,
    ) -> Result<Option<IntegrationConfig>, StoreError> {
        let mut entries = self.entries.write().await;
        Ok(entries
            .get_mut(&storage_key(form_id, integration_id))
            .map(|entry| {
                entry.enabled = enabled;
                entry.updated_at = Utc::now();
                entry.clone()
            }))
    }

    async fn list_for_form(
        &self,
        form_id: Uuid,
    ) -> Result<HashMap<String, IntegrationConfig>, StoreError> {
        let prefix = form_prefix(form_id);
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .filter_map(|(key, entry)| {
                key.strip_prefix(&prefix)
                    .map(|integration_id| (integration_id.to_string(), entry.clone()))
            })
            .collect())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Redis backend
// ────────────────────────────────────────────────────────────────────────────

/// Stores each configuration as a JSON string under
/// `integration:{form_id}:{integration_id}`.
#[derive(Clone)]
pub struct RedisIntegrationStore {
    client: redis::Client,
}

impl RedisIntegrationStore {
    pub fn new(client: redis::Client) -> Self {
        info!("Integration configs stored in Redis");
        Self { client }
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, StoreError> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    async fn write(&self, key: &str, entry: &IntegrationConfig) -> Result<(), StoreError> {
        let payload = serde_json::to_string(entry)?;
        let mut conn = self.connection().await?;
        conn.set::<_, _, ()>(key, payload).await?;
        debug!(key, "integration config written");
        Ok(())
    }
}

#[async_trait]
impl IntegrationStore for RedisIntegrationStore {
    async fn get(
        &self,
        form_id: Uuid,
        integration_id: &str,
    ) -> Result<Option<IntegrationConfig>, StoreError> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn.get(storage_key(form_id, integration_id)).await?;
        Ok(raw.map(|s| serde_json::from_str(&s)).transpose()?)
    }

    async fn save(
        &self,
        form_id: Uuid,
        integration_id: &str,
        config: Value,
    ) -> Result<IntegrationConfig, StoreError> {
        let entry = enabled_config(config);
        self.write(&storage_key(form_id, integration_id), &entry)
            .await?;
        Ok(entry)
    }

    async fn set_enabled(
        &self,
        form_id: Uuid,
        integration_id: &str,
        enabled: bool,
    ) -> Result<Option<IntegrationConfig>, StoreError> {
        let Some(mut entry) = self.get(form_id, integration_id).await? else {
            return Ok(None);
        };
        entry.enabled = enabled;
        entry.updated_at = Utc::now();
        self.write(&storage_key(form_id, integration_id), &entry)
            .await?;
        Ok(Some(entry))
    }

    /// One MGET over the catalog keys of the form.
    async fn list_for_form(
        &self,
        form_id: Uuid,
    ) -> Result<HashMap<String, IntegrationConfig>, StoreError> {
        let ids: Vec<&'static str> = catalog::catalog().iter().map(|meta| meta.id).collect();
        let keys: Vec<String> = ids.iter().map(|id| storage_key(form_id, id)).collect();
        let mut conn = self.connection().await?;
        let raw: Vec<Option<String>> = conn.mget(keys).await?;

        let mut configs = HashMap::new();
        for (id, payload) in ids.into_iter().zip(raw) {
            if let Some(payload) = payload {
                configs.insert(id.to_string(), serde_json::from_str(&payload)?);
            }
        }
        Ok(configs)
    }
}
