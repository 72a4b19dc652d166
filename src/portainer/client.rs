//! Portainer session client
//!
//! Owns the HTTP client and the session token. Every request goes through
//! [`PortainerClient::send`], which attaches the bearer token and folds
//! transport and HTTP failures into [`PortainerError`].

use super::models::{ErrorBody, LoginRequest, LoginResponse};
use crate::error::PortainerError;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

/// Path of the Portainer API root
pub const API_ROOT: &str = "/api/";

/// Client for a single Portainer instance
pub struct PortainerClient {
    /// API root URL, always ending in `/api/`
    base_url: Url,
    /// HTTP client
    client: reqwest::Client,
    /// Bearer token, set by a successful login
    token: Option<String>,
}

impl PortainerClient {
    /// Create a new client. The URL path is replaced by the API root.
    pub fn new(mut url: Url) -> Result<Self, PortainerError> {
        url.set_path(API_ROOT);
        url.set_query(None);
        url.set_fragment(None);

        let client = reqwest::Client::builder()
            .user_agent(concat!("portainer-deploy/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PortainerError::transport(&e))?;

        Ok(Self {
            base_url: url,
            client,
            token: None,
        })
    }

    /// API root every path is resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// True once a login has succeeded
    pub fn is_authorized(&self) -> bool {
        self.token.is_some()
    }

    /// Authenticate and keep the returned token for later requests
    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), PortainerError> {
        let request = self
            .request(Method::POST, "auth")?
            .json(&LoginRequest { username, password });

        let response: LoginResponse = self.send_json(request).await?;
        self.token = Some(response.jwt);

        debug!("Authenticated against {} as {}", self.base_url, username);
        Ok(())
    }

    /// Start a request for a path relative to the API root
    pub(crate) fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, PortainerError> {
        let url = self.base_url.join(path).map_err(|e| {
            PortainerError::new(0, format!("Invalid API path '{}': {}", path, e), e.to_string())
        })?;

        Ok(self.client.request(method, url))
    }

    /// Attach the session token, if any
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token {
            Some(ref token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request, returning the response only for 2xx statuses
    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response, PortainerError> {
        let request = self
            .authorize(request)
            .build()
            .map_err(|e| PortainerError::transport(&e))?;

        debug!("{} {}", request.method(), request.url());

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| PortainerError::transport(&e))?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        Ok(response)
    }

    /// Send a request and decode its JSON body
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, PortainerError> {
        let response = self.send(request).await?;
        let status = response.status().as_u16();
        let url = response.url().to_string();

        response.json().await.map_err(|e| {
            PortainerError::new(
                status,
                format!("Invalid response body: {}", e),
                serde_json::json!({ "status": status, "url": url }).to_string(),
            )
        })
    }
}

/// Build the error for a non-2xx response.
///
/// `message` and `details` come from the JSON error body when present,
/// otherwise both carry a serialized description of the response.
async fn error_from_response(response: Response) -> PortainerError {
    let status = response.status().as_u16();
    let url = response.url().to_string();
    let (body, read_error) = match response.text().await {
        Ok(body) => (body, None),
        Err(e) => (String::new(), Some(e.to_string())),
    };

    let fallback = fallback_details(status, &url, &body, read_error.as_deref());

    let parsed: ErrorBody = serde_json::from_str(&body).unwrap_or_default();
    let message = parsed.message.filter(|m| !m.is_empty());
    let details = parsed.details.filter(|d| !d.is_empty());

    debug!("Request to {} failed with status {}", url, status);

    PortainerError::new(
        status,
        message.unwrap_or_else(|| fallback.clone()),
        details.unwrap_or(fallback),
    )
}

/// Serialized description of a failed response
fn fallback_details(status: u16, url: &str, body: &str, read_error: Option<&str>) -> String {
    let mut details = serde_json::json!({
        "status": status,
        "url": url,
        "body": body,
    });

    if let Some(error) = read_error {
        details["read_error"] = serde_json::Value::from(error);
    }

    details.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server, ServerGuard};
    use serde_json::json;

    fn client_for(server: &ServerGuard) -> PortainerClient {
        PortainerClient::new(Url::parse(&server.url()).unwrap()).unwrap()
    }

    #[test]
    fn test_base_url_is_rewritten_to_api_root() {
        let client = PortainerClient::new(Url::parse("https://portainer.local").unwrap()).unwrap();
        assert_eq!(client.base_url().as_str(), "https://portainer.local/api/");

        let client =
            PortainerClient::new(Url::parse("https://portainer.local:9443/#!/home").unwrap()).unwrap();
        assert_eq!(client.base_url().path(), "/api/");

        let client =
            PortainerClient::new(Url::parse("http://10.0.0.2:9000/api/").unwrap()).unwrap();
        assert_eq!(client.base_url().as_str(), "http://10.0.0.2:9000/api/");
    }

    #[test]
    fn test_base_url_drops_query_and_fragment() {
        let client =
            PortainerClient::new(Url::parse("https://h:9443/?q=1#!/home").unwrap()).unwrap();
        assert_eq!(client.base_url().as_str(), "https://h:9443/api/");

        let client =
            PortainerClient::new(Url::parse("https://h:9443/api/?q=1").unwrap()).unwrap();
        assert_eq!(client.base_url().as_str(), "https://h:9443/api/");
    }

    #[test]
    fn test_fallback_details_keeps_read_error() {
        let details = fallback_details(500, "http://h/api/auth", "", Some("connection reset"));
        let value: serde_json::Value = serde_json::from_str(&details).unwrap();

        assert_eq!(value["status"], 500);
        assert_eq!(value["body"], "");
        assert_eq!(value["read_error"], "connection reset");

        let details = fallback_details(502, "http://h/api/auth", "Bad Gateway", None);
        let value: serde_json::Value = serde_json::from_str(&details).unwrap();
        assert!(value.get("read_error").is_none());
    }

    #[test]
    fn test_new_client_is_not_authorized() {
        let client = PortainerClient::new(Url::parse("http://localhost:9000").unwrap()).unwrap();
        assert!(!client.is_authorized());
    }

    #[tokio::test]
    async fn test_login_attaches_bearer_to_later_requests() {
        let mut server = Server::new_async().await;

        let login = server
            .mock("POST", "/api/auth")
            .match_header("authorization", Matcher::Missing)
            .match_body(Matcher::Json(json!({"username": "admin", "password": "secret"})))
            .with_status(200)
            .with_body(r#"{"jwt":"token-123"}"#)
            .create_async()
            .await;

        let swarm = server
            .mock("GET", "/api/endpoints/1/docker/swarm")
            .match_header("authorization", "Bearer token-123")
            .with_status(200)
            .with_body(r#"{"ID":"swarm-1"}"#)
            .create_async()
            .await;

        let mut client = client_for(&server);
        client.login("admin", "secret").await.unwrap();
        assert!(client.is_authorized());

        let result = client.get_swarm(1).await.unwrap();
        assert_eq!(result.id, "swarm-1");

        login.assert_async().await;
        swarm.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejected_login_keeps_client_unauthorized() {
        let mut server = Server::new_async().await;

        server
            .mock("POST", "/api/auth")
            .with_status(422)
            .with_body(r#"{"message":"Invalid credentials","details":"Unauthorized"}"#)
            .create_async()
            .await;

        let mut client = client_for(&server);
        let err = client.login("admin", "wrong").await.unwrap_err();

        assert_eq!(err.status, 422);
        assert_eq!(err.message, "Invalid credentials");
        assert_eq!(err.details, "Unauthorized");
        assert!(!client.is_authorized());
    }

    #[tokio::test]
    async fn test_error_without_json_body_uses_fallback() {
        let mut server = Server::new_async().await;

        server
            .mock("POST", "/api/auth")
            .with_status(502)
            .with_body("Bad Gateway")
            .create_async()
            .await;

        let mut client = client_for(&server);
        let err = client.login("admin", "secret").await.unwrap_err();

        assert_eq!(err.status, 502);
        assert_eq!(err.message, err.details);

        let fallback: serde_json::Value = serde_json::from_str(&err.message).unwrap();
        assert_eq!(fallback["status"], 502);
        assert_eq!(fallback["body"], "Bad Gateway");
    }

    #[tokio::test]
    async fn test_transport_failure_has_status_zero() {
        // Nothing listens on the discard port
        let mut client = PortainerClient::new(Url::parse("http://127.0.0.1:9").unwrap()).unwrap();

        let err = client.login("admin", "secret").await.unwrap_err();
        assert_eq!(err.status, 0);
        assert!(err.is_transport());
        assert!(!err.message.is_empty());
        assert!(!client.is_authorized());
    }

    #[tokio::test]
    async fn test_undecodable_success_body() {
        let mut server = Server::new_async().await;

        server
            .mock("POST", "/api/auth")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let mut client = client_for(&server);
        let err = client.login("admin", "secret").await.unwrap_err();

        assert_eq!(err.status, 200);
        assert!(err.message.starts_with("Invalid response body"));
        assert!(!client.is_authorized());
    }
}
