//! Credential persistence
//!
//! The credential record lives inside the connector's JSON config file.
//! Saving rewrites the whole file with the token keys updated and every other
//! key preserved.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rseries_core::CredentialStore;
use rseries_domain::{ConnectorConfig, ConnectorError, Credentials, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::debug;

use crate::errors::InfraError;

/// Stores credentials in the connector's JSON config file.
#[derive(Debug)]
pub struct JsonFileCredentialStore {
    path: PathBuf,
    // Serializes read-modify-write cycles.
    write_lock: Mutex<()>,
}

impl JsonFileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_object(&self) -> Result<Map<String, Value>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(err) => return Err(InfraError::from(err).into()),
        };

        match serde_json::from_str::<Value>(&contents).map_err(InfraError::from)? {
            Value::Object(map) => Ok(map),
            _ => Err(ConnectorError::Config(format!(
                "{} does not contain a JSON object",
                self.path.display()
            ))),
        }
    }
}

#[async_trait]
impl CredentialStore for JsonFileCredentialStore {
    async fn load(&self) -> Result<Credentials> {
        let object = self.read_object().await?;
        let config: ConnectorConfig =
            serde_json::from_value(Value::Object(object)).map_err(InfraError::from)?;
        Ok(config.credentials())
    }

    async fn save(&self, credentials: &Credentials) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut object = self.read_object().await?;

        let optional = |value: &Option<String>| value.clone().map_or(Value::Null, Value::String);
        object.insert("access_token".into(), optional(&credentials.access_token));
        object.insert("refresh_token".into(), optional(&credentials.refresh_token));
        object.insert("expires_in".into(), credentials.expires_at.map_or(Value::Null, Value::from));

        let contents = to_pretty_json(&Value::Object(object))?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, contents).await.map_err(InfraError::from)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(InfraError::from)?;

        debug!(path = %self.path.display(), "Credentials written to config file");
        Ok(())
    }
}

fn to_pretty_json(value: &Value) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer).map_err(InfraError::from)?;
    Ok(buffer)
}

/// In-memory store, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credentials: Mutex<Credentials>,
    saves: Mutex<u32>,
}

impl MemoryCredentialStore {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials: Mutex::new(credentials), saves: Mutex::new(0) }
    }

    /// Number of successful `save` calls.
    pub async fn save_count(&self) -> u32 {
        *self.saves.lock().await
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> Result<Credentials> {
        Ok(self.credentials.lock().await.clone())
    }

    async fn save(&self, credentials: &Credentials) -> Result<()> {
        *self.credentials.lock().await = credentials.clone();
        *self.saves.lock().await += 1;
        Ok(())
    }
}
