//! portainer-deploy - update a Docker Swarm stack through Portainer
//!
//! Logs into a Portainer instance, finds a named stack on the swarm of an
//! endpoint and replaces its stack file and environment:
//!
//! - Portainer session and swarm/stack API client
//! - Environment variable merging
//! - Update orchestration with a terminal outcome per run
//! - CI workflow reporting

pub mod config;
pub mod deploy;
pub mod error;
pub mod portainer;
pub mod workflow;

pub use error::{DeployError, PortainerError, Result};
