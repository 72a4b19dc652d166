//! Stack update orchestration
//!
//! Drives one update: login, swarm and stack resolution, environment merge
//! and the stack write. Steps run strictly in order and any API error ends
//! the run.

use super::env::merge_env;
use crate::config::Config;
use crate::error::{DeployError, PortainerError, Result};
use crate::portainer::{PortainerClient, Stack, StackPatch};
use crate::workflow::Workflow;
use std::fmt;
use tracing::{debug, info};

/// Progress of an update run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateState {
    Unauthenticated,
    Authenticated,
    SwarmResolved,
    StackResolved,
    Completed,
    NotFound,
    Failed,
}

impl fmt::Display for UpdateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateState::Unauthenticated => write!(f, "unauthenticated"),
            UpdateState::Authenticated => write!(f, "authenticated"),
            UpdateState::SwarmResolved => write!(f, "swarm resolved"),
            UpdateState::StackResolved => write!(f, "stack resolved"),
            UpdateState::Completed => write!(f, "completed"),
            UpdateState::NotFound => write!(f, "not found"),
            UpdateState::Failed => write!(f, "failed"),
        }
    }
}

/// Terminal result of an update run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The stack write was accepted
    Updated { stack_id: u64 },
    /// No stack with the configured name exists in the swarm
    NotFound { stack_name: String },
    /// An API call failed after reaching `state`
    Failed {
        state: UpdateState,
        error: PortainerError,
    },
}

impl UpdateOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, UpdateOutcome::Updated { .. })
    }

    /// Publish `stack-id` on success, otherwise return the run's error
    pub fn publish(self, workflow: &Workflow) -> Result<u64> {
        match self {
            UpdateOutcome::Updated { stack_id } => {
                workflow.set_output("stack-id", &stack_id.to_string())?;
                Ok(stack_id)
            }
            UpdateOutcome::NotFound { stack_name } => Err(DeployError::StackNotFound(stack_name)),
            UpdateOutcome::Failed { error, .. } => Err(DeployError::Portainer(error)),
        }
    }
}

impl fmt::Display for UpdateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateOutcome::Updated { stack_id } => write!(f, "Stack {} updated", stack_id),
            UpdateOutcome::NotFound { stack_name } => write!(f, "Stack {} not found!", stack_name),
            UpdateOutcome::Failed { error, .. } => write!(f, "{}", error.message),
        }
    }
}

/// Runs the update sequence for one configured stack
pub struct StackUpdater {
    client: PortainerClient,
    config: Config,
    workflow: Workflow,
    state: UpdateState,
}

impl StackUpdater {
    /// Create an updater with a fresh session for the configured instance
    pub fn new(config: Config, workflow: Workflow) -> std::result::Result<Self, PortainerError> {
        let client = PortainerClient::new(config.portainer.url.clone())?;

        Ok(Self {
            client,
            config,
            workflow,
            state: UpdateState::Unauthenticated,
        })
    }

    /// Current state
    pub fn state(&self) -> UpdateState {
        self.state
    }

    /// Run the update to a terminal outcome
    pub async fn run(&mut self) -> UpdateOutcome {
        match self.execute().await {
            Ok(Some(stack_id)) => {
                self.advance(UpdateState::Completed);
                UpdateOutcome::Updated { stack_id }
            }
            Ok(None) => {
                self.advance(UpdateState::NotFound);
                UpdateOutcome::NotFound {
                    stack_name: self.config.stack.name.clone(),
                }
            }
            Err(error) => {
                let state = self.state;
                self.advance(UpdateState::Failed);
                UpdateOutcome::Failed { state, error }
            }
        }
    }

    async fn execute(&mut self) -> std::result::Result<Option<u64>, PortainerError> {
        let endpoint = self.config.portainer.endpoint;

        {
            let _group = self.workflow.group("Auth");
            self.client
                .login(&self.config.portainer.username, &self.config.portainer.password)
                .await?;
        }
        self.advance(UpdateState::Authenticated);

        let stack = {
            let _group = self.workflow.group("Get State");

            info!("Get current swarm id of endpoint #{}", endpoint);
            let swarm = self.client.get_swarm(endpoint).await?;
            self.advance(UpdateState::SwarmResolved);

            info!("Get stacks of swarm cluster {}", swarm.id);
            let stacks = self.client.get_stacks(&swarm.id).await?;
            find_stack(stacks, &self.config.stack.name)
        };

        let Some(stack) = stack else {
            return Ok(None);
        };
        self.advance(UpdateState::StackResolved);

        let _group = self.workflow.group(format!("Update stack (id: {})", stack.id));

        // Only confirms the stack file is readable; the configured file is deployed.
        self.client.get_stack_file(stack.id).await?;

        let patch = StackPatch {
            id: stack.id,
            endpoint_id: endpoint,
            stack_file: self.config.stack.file.clone(),
            env: merge_env(&stack.env, &self.config.stack.vars),
            prune: self.config.stack.update_prune,
            pull_image: self.config.stack.pull_image,
        };

        self.client.update_stack(&patch).await?;
        Ok(Some(stack.id))
    }

    fn advance(&mut self, next: UpdateState) {
        debug!("Update state: {} -> {}", self.state, next);
        self.state = next;
    }
}

/// First stack with exactly this name, in server order
pub fn find_stack(stacks: Vec<Stack>, name: &str) -> Option<Stack> {
    stacks.into_iter().find(|stack| stack.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portainer::EnvVar;

    fn stack(id: u64, name: &str) -> Stack {
        Stack {
            id,
            name: name.to_string(),
            env: vec![EnvVar::new("ID", id.to_string())],
        }
    }

    #[test]
    fn test_find_stack_is_exact() {
        let stacks = vec![stack(1, "Web"), stack(2, "web-api"), stack(3, "web")];
        assert_eq!(find_stack(stacks, "web").map(|s| s.id), Some(3));
    }

    #[test]
    fn test_find_stack_first_match_wins() {
        let stacks = vec![stack(4, "web"), stack(5, "web")];
        assert_eq!(find_stack(stacks, "web").map(|s| s.id), Some(4));
    }

    #[test]
    fn test_find_stack_missing() {
        assert!(find_stack(vec![stack(1, "db")], "web").is_none());
        assert!(find_stack(Vec::new(), "web").is_none());
    }

    #[test]
    fn test_outcome_messages() {
        let not_found = UpdateOutcome::NotFound {
            stack_name: "web".to_string(),
        };
        assert_eq!(not_found.to_string(), "Stack web not found!");
        assert!(!not_found.is_success());

        let failed = UpdateOutcome::Failed {
            state: UpdateState::Unauthenticated,
            error: PortainerError::new(401, "Unauthorized", ""),
        };
        assert_eq!(failed.to_string(), "Unauthorized");

        assert!(UpdateOutcome::Updated { stack_id: 3 }.is_success());
    }

    #[test]
    fn test_publish_errors_carry_run_message() {
        let workflow = Workflow::default().with_writer(std::io::sink());

        let err = UpdateOutcome::NotFound {
            stack_name: "web".to_string(),
        }
        .publish(&workflow)
        .unwrap_err();
        assert!(matches!(err, DeployError::StackNotFound(ref name) if name == "web"));
        assert_eq!(err.to_string(), "Stack web not found!");

        let err = UpdateOutcome::Failed {
            state: UpdateState::Authenticated,
            error: PortainerError::new(404, "Endpoint not found", ""),
        }
        .publish(&workflow)
        .unwrap_err();
        assert!(matches!(err, DeployError::Portainer(ref e) if e.status == 404));
        assert_eq!(err.to_string(), "Endpoint not found");
    }
}
