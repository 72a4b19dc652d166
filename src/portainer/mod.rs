//! Portainer API client
//!
//! This module provides the session client and the swarm/stack
//! operations used to update a deployed stack.

pub mod client;
pub mod models;
pub mod stacks;

pub use client::PortainerClient;
pub use models::{EnvVar, Stack, StackPatch, Swarm};
