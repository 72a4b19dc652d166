//! Portainer domain types and their wire representations

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Docker Swarm cluster attached to an endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Swarm {
    /// Swarm identifier
    pub id: String,
}

/// Single stack environment entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

impl EnvVar {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Stack deployed on a swarm
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stack {
    /// Stack identifier
    pub id: u64,
    /// Stack name, used as the lookup key
    pub name: String,
    /// Environment entries in server order
    pub env: Vec<EnvVar>,
}

/// Write-side payload for a stack update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackPatch {
    /// Stack to update
    pub id: u64,
    /// Endpoint the stack is deployed on
    pub endpoint_id: u64,
    /// Full stack file content
    pub stack_file: String,
    /// Merged environment, one value per key
    pub env: BTreeMap<String, String>,
    /// Remove services missing from the new file
    pub prune: bool,
    /// Re-pull images
    pub pull_image: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    pub jwt: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SwarmResponse {
    #[serde(rename = "ID")]
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StackResponse {
    #[serde(rename = "Id")]
    pub id: u64,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Env", default)]
    pub env: Option<Vec<EnvVar>>,
}

impl From<StackResponse> for Stack {
    fn from(item: StackResponse) -> Self {
        Self {
            id: item.id,
            name: item.name,
            env: item.env.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StackFileResponse {
    #[serde(rename = "StackFileContent")]
    pub stack_file_content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct UpdateStackRequest<'a> {
    pub stack_file_content: &'a str,
    pub env: Vec<EnvVar>,
    pub prune: bool,
    pub pull_image: bool,
}

impl<'a> From<&'a StackPatch> for UpdateStackRequest<'a> {
    fn from(patch: &'a StackPatch) -> Self {
        Self {
            stack_file_content: &patch.stack_file,
            env: patch
                .env
                .iter()
                .map(|(name, value)| EnvVar::new(name.as_str(), value.as_str()))
                .collect(),
            prune: patch.prune,
            pull_image: patch.pull_image,
        }
    }
}

/// Error body returned by the Portainer API
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
}
