//! Swarm and stack operations

use super::client::PortainerClient;
use super::models::{
    Stack, StackFileResponse, StackPatch, StackResponse, Swarm, SwarmResponse, UpdateStackRequest,
};
use crate::error::PortainerError;
use reqwest::Method;

impl PortainerClient {
    /// Resolve the swarm of an endpoint
    pub async fn get_swarm(&self, endpoint_id: u64) -> Result<Swarm, PortainerError> {
        let path = format!("endpoints/{}/docker/swarm", endpoint_id);
        let response: SwarmResponse = self.send_json(self.request(Method::GET, &path)?).await?;

        Ok(Swarm { id: response.id })
    }

    /// List the stacks of a swarm
    pub async fn get_stacks(&self, swarm_id: &str) -> Result<Vec<Stack>, PortainerError> {
        let filters = serde_json::json!({ "SwarmId": swarm_id }).to_string();
        let request = self
            .request(Method::GET, "stacks")?
            .query(&[("filters", filters)]);

        let stacks: Vec<StackResponse> = self.send_json(request).await?;
        Ok(stacks.into_iter().map(Stack::from).collect())
    }

    /// Fetch the current stack file
    pub async fn get_stack_file(&self, stack_id: u64) -> Result<String, PortainerError> {
        let path = format!("stacks/{}/file", stack_id);
        let response: StackFileResponse = self.send_json(self.request(Method::GET, &path)?).await?;

        Ok(response.stack_file_content)
    }

    /// Replace a stack's file, environment and update flags
    pub async fn update_stack(&self, patch: &StackPatch) -> Result<(), PortainerError> {
        let path = format!("stacks/{}", patch.id);
        let request = self
            .request(Method::PUT, &path)?
            .query(&[("endpointId", patch.endpoint_id)])
            .json(&UpdateStackRequest::from(patch));

        self.send(request).await?;
        Ok(())
    }
}
