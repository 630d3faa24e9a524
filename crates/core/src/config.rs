// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process configuration and policy documents.
//!
//! Both are nested key-value JSON documents written by the external
//! launcher. The configuration is read once per host invocation and is
//! immutable afterward; the policy document is optional and an absent file
//! means "no policy enforced".

use crate::error::HostError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Process/project metadata forwarded into the interpreter's argument map.
///
/// `rename_all` on the outer configuration does not reach through
/// `flatten`, so the casing is declared here as well.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessMeta {
    #[serde(default)]
    pub process_info: Map<String, Value>,
    #[serde(default)]
    pub project_info: Map<String, Value>,
}

/// The per-invocation process configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessConfiguration {
    /// Flow entry point to start from on a fresh run.
    pub entry_point: String,
    /// Initial interpreter arguments.
    pub arguments: Map<String, Value>,
    /// Active configuration profiles.
    pub active_profiles: Vec<String>,
    /// Expressions evaluated by the interpreter to produce output variables.
    pub out_expressions: Vec<String>,
    /// Process and project metadata.
    #[serde(flatten)]
    pub meta: ProcessMeta,
    /// Session credential used for all remote calls of this invocation.
    pub session_token: String,
}

impl Default for ProcessConfiguration {
    fn default() -> Self {
        Self {
            entry_point: "default".to_string(),
            arguments: Map::new(),
            active_profiles: Vec::new(),
            out_expressions: Vec::new(),
            meta: ProcessMeta::default(),
            session_token: String::new(),
        }
    }
}

impl ProcessConfiguration {
    /// Read the configuration document from `path`.
    pub fn load(path: &Path) -> Result<Self, HostError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            HostError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&raw)
            .map_err(|e| HostError::Config(format!("cannot parse {}: {}", path.display(), e)))
    }

    /// Merge default arguments under existing ones.
    ///
    /// Explicit argument values always win; defaults only fill gaps. Nested
    /// objects are merged one level deep, matching the launcher's contract.
    pub fn apply_default_arguments(&mut self, defaults: &Map<String, Value>) {
        for (key, default_value) in defaults {
            match (self.arguments.get_mut(key), default_value) {
                (None, _) => {
                    self.arguments.insert(key.clone(), default_value.clone());
                }
                (Some(Value::Object(existing)), Value::Object(default_obj)) => {
                    for (k, v) in default_obj {
                        existing.entry(k.clone()).or_insert_with(|| v.clone());
                    }
                }
                _ => {}
            }
        }
    }
}

/// Optional policy document loaded from the system directory.
///
/// Threaded explicitly through the controller rather than installed into a
/// process-wide singleton; dropped with the controller at shutdown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyDocument(pub Map<String, Value>);

impl PolicyDocument {
    /// Load the policy file, returning an empty document if it is absent.
    pub fn load_or_empty(path: &Path) -> Result<Self, HostError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
