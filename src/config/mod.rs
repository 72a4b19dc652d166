//! Run configuration
//!
//! Inputs come from command-line flags or their environment variables and
//! are turned into a [`Config`] before any API call is made.

pub mod vars;

use crate::error::{DeployError, Result};
use clap::{ArgAction, Args};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use url::Url;

pub use vars::{parse_vars, resolve_vars};

/// Raw inputs, before the stack file and variables are loaded
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Portainer base URL
    #[arg(long, env = "PORTAINER_URL")]
    pub portainer_url: Url,

    /// Portainer username
    #[arg(long, env = "PORTAINER_USERNAME")]
    pub portainer_username: String,

    /// Portainer password
    #[arg(long, env = "PORTAINER_PASSWORD", hide_env_values = true)]
    pub portainer_password: String,

    /// Numeric id of the swarm endpoint
    #[arg(long, env = "PORTAINER_ENDPOINT")]
    pub portainer_endpoint: u64,

    /// Name of the stack to update
    #[arg(long, env = "STACK_NAME")]
    pub stack_name: String,

    /// Path to the new stack file
    #[arg(long, env = "STACK_FILE")]
    pub stack_file: PathBuf,

    /// Stack variables: path to a YAML file or inline YAML
    #[arg(long, env = "STACK_VARS")]
    pub stack_vars: Option<String>,

    /// Remove services missing from the new stack file
    #[arg(
        long,
        env = "STACK_UPDATE_PRUNE",
        action = ArgAction::Set,
        value_parser = parse_flag,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true"
    )]
    pub stack_update_prune: bool,

    /// Re-pull images when updating
    #[arg(
        long,
        env = "STACK_PULL_IMAGE",
        action = ArgAction::Set,
        value_parser = parse_flag,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true"
    )]
    pub stack_pull_image: bool,
}

/// Parse a boolean flag value. Empty means false.
pub fn parse_flag(value: &str) -> std::result::Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "false" | "f" | "no" | "n" | "off" | "0" => Ok(false),
        "true" | "t" | "yes" | "y" | "on" | "1" => Ok(true),
        other => Err(format!("'{}' is not a boolean", other)),
    }
}

/// Portainer connection settings
#[derive(Clone)]
pub struct PortainerConfig {
    /// Base URL
    pub url: Url,
    /// Username
    pub username: String,
    /// Password
    pub password: String,
    /// Endpoint id
    pub endpoint: u64,
}

impl fmt::Debug for PortainerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortainerConfig")
            .field("url", &self.url.as_str())
            .field("username", &self.username)
            .field("password", &"***")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Target stack and its new definition
#[derive(Debug, Clone)]
pub struct StackConfig {
    /// Stack name
    pub name: String,
    /// New stack file content
    pub file: String,
    /// Variables overlaid on the stack environment
    pub vars: BTreeMap<String, String>,
    /// Prune services on update
    pub update_prune: bool,
    /// Pull images on update
    pub pull_image: bool,
}

/// Complete configuration for one run
#[derive(Debug, Clone)]
pub struct Config {
    pub portainer: PortainerConfig,
    pub stack: StackConfig,
}

impl Config {
    /// Load the stack file and variables referenced by the inputs
    pub fn load(args: ConfigArgs) -> Result<Self> {
        if args.stack_name.is_empty() {
            return Err(DeployError::InvalidConfig(
                "Stack name must not be empty".to_string(),
            ));
        }

        let file = std::fs::read_to_string(&args.stack_file).map_err(|e| {
            DeployError::InvalidConfig(format!(
                "Failed to read stack file {}: {}",
                args.stack_file.display(),
                e
            ))
        })?;

        let vars = resolve_vars(args.stack_vars.as_deref())?;

        Ok(Self {
            portainer: PortainerConfig {
                url: args.portainer_url,
                username: args.portainer_username,
                password: args.portainer_password,
                endpoint: args.portainer_endpoint,
            },
            stack: StackConfig {
                name: args.stack_name,
                file,
                vars,
                update_prune: args.stack_update_prune,
                pull_image: args.stack_pull_image,
            },
        })
    }
}
