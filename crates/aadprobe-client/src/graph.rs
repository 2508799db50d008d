use std::time::{Duration, Instant};

use aadprobe_config::ProbeConfig;
use aadprobe_domain::{Application, ObjectId};
use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::debug;

use crate::client::DirectoryClient;
use crate::error::ClientError;

/// Resource the Azure AD Graph tokens are issued for.
const GRAPH_RESOURCE: &str = "https://graph.windows.net/";

// ── Token provider ────────────────────────────────────────────────────────────

/// Abstraction over bearer token acquisition; enables test injection.
#[async_trait]
trait TokenProvider: Send + Sync {
    async fn token(&self) -> Result<String, ClientError>;
}

// ── Service Principal ─────────────────────────────────────────────────────────

struct ServicePrincipalTokenProvider {
    tenant_id:     String,
    client_id:     String,
    client_secret: String,
    login_base:    String,
    client:        reqwest::Client,
    cache:         Mutex<Option<(String, Instant)>>,
}

#[async_trait]
impl TokenProvider for ServicePrincipalTokenProvider {
    async fn token(&self) -> Result<String, ClientError> {
        {
            let guard = self.cache.lock().await;
            if let Some((tok, expiry)) = guard.as_ref() {
                if Instant::now() < *expiry {
                    return Ok(tok.clone());
                }
            }
        }

        let url = format!("{}/{}/oauth2/v2.0/token", self.login_base, self.tenant_id);
        let scope = format!("{}.default", GRAPH_RESOURCE);
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", scope.as_str()),
        ];
        let resp = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(|e| ClientError::from_transport("SP token request", e))?;

        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            let body: Value = resp.json().await.unwrap_or(Value::Null);
            return Err(ClientError::from_status(
                status,
                format!("SP token request: status {}: {}", status, parse_graph_error(&body)),
            ));
        }
        let body: Value = resp
            .json()
            .await
            .map_err(|e| ClientError::Other(format!("SP token decode: {}", e)))?;

        let tok = body["access_token"]
            .as_str()
            .ok_or_else(|| ClientError::Other(format!("SP token: no access_token in response: {}", body)))?
            .to_string();
        let expires_in = body["expires_in"].as_u64().unwrap_or(3600);
        let expiry = Instant::now() + Duration::from_secs(expires_in.saturating_sub(60));

        *self.cache.lock().await = Some((tok.clone(), expiry));
        Ok(tok)
    }
}

// ── Azure CLI ─────────────────────────────────────────────────────────────────

struct AzureCliTokenProvider {
    tenant_id: String,
}

#[async_trait]
impl TokenProvider for AzureCliTokenProvider {
    async fn token(&self) -> Result<String, ClientError> {
        let output = Command::new("az")
            .args([
                "account",
                "get-access-token",
                "--resource",
                GRAPH_RESOURCE,
                "--tenant",
                &self.tenant_id,
                "--output",
                "json",
            ])
            .output()
            .await
            .map_err(|e| ClientError::Other(format!("az CLI not found: {}. Install Azure CLI or set ARM_CLIENT_ID/ARM_CLIENT_SECRET.", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ClientError::Other(format!(
                "az account get-access-token failed: {}. Run 'az login' first.",
                stderr.trim()
            )));
        }

        let resp: Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| ClientError::Other(format!("az CLI output parse: {}", e)))?;
        let tok = resp["accessToken"]
            .as_str()
            .ok_or_else(|| ClientError::Other("az CLI: no accessToken in output".into()))?
            .to_string();
        Ok(tok)
    }
}

// ── Static ────────────────────────────────────────────────────────────────────

struct StaticToken(String);

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> Result<String, ClientError> {
        Ok(self.0.clone())
    }
}

// ── GraphClient ───────────────────────────────────────────────────────────────

/// [`DirectoryClient`] backed by the Azure AD Graph REST API.
pub struct GraphClient {
    tenant_id:   String,
    graph_base:  String,
    api_version: String,
    client:      reqwest::Client,
    token:       Box<dyn TokenProvider>,
}

impl GraphClient {
    /// Create a `GraphClient`, auto-selecting the token provider:
    /// 1. `client_id` + `client_secret` in config → Service Principal
    /// 2. Otherwise → Azure CLI (`az account get-access-token`)
    pub fn new(config: &ProbeConfig) -> Result<Self, ClientError> {
        let tenant_id = config.precheck()?.to_string();
        let client = build_http_client(config)?;

        let token: Box<dyn TokenProvider> = match (&config.client_id, &config.client_secret) {
            (Some(cid), Some(cs)) => Box::new(ServicePrincipalTokenProvider {
                tenant_id:     tenant_id.clone(),
                client_id:     cid.clone(),
                client_secret: cs.clone(),
                login_base:    config.login_base_url.clone(),
                client:        client.clone(),
                cache:         Mutex::new(None),
            }),
            _ => Box::new(AzureCliTokenProvider { tenant_id: tenant_id.clone() }),
        };

        Ok(Self {
            tenant_id,
            graph_base: config.graph_base_url.clone(),
            api_version: config.api_version.clone(),
            client,
            token,
        })
    }

    /// Create a `GraphClient` that always presents `token`.
    pub fn with_static_token(config: &ProbeConfig, token: &str) -> Result<Self, ClientError> {
        let tenant_id = config.precheck()?.to_string();
        Ok(Self {
            tenant_id,
            graph_base: config.graph_base_url.clone(),
            api_version: config.api_version.clone(),
            client: build_http_client(config)?,
            token: Box::new(StaticToken(token.to_string())),
        })
    }

    fn application_url(&self, id: &ObjectId) -> String {
        format!(
            "{}/{}/applications/{}?api-version={}",
            self.graph_base, self.tenant_id, id, self.api_version
        )
    }
}

fn build_http_client(config: &ProbeConfig) -> Result<reqwest::Client, ClientError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
        .map_err(|e| ClientError::Other(format!("build HTTP client: {}", e)))
}

/// Extract `code: message` from a Graph error body.
///
/// Handles both the AAD Graph (`odata.error` with `message.value`) and the
/// Microsoft Graph (`error` with a plain `message`) shapes.
fn parse_graph_error(body: &Value) -> String {
    let err = body
        .get("odata.error")
        .or_else(|| body.get("error"))
        .unwrap_or(body);
    let code = err["code"].as_str().unwrap_or("Unknown");
    let message = err["message"]
        .as_str()
        .or_else(|| err["message"]["value"].as_str())
        .unwrap_or("unknown error");
    format!("{}: {}", code, message)
}

#[async_trait]
impl DirectoryClient for GraphClient {
    fn name(&self) -> &'static str {
        "graph"
    }

    async fn get_application(&self, id: &ObjectId) -> Result<Application, ClientError> {
        let token = self.token.token().await?;
        let url = self.application_url(id);
        debug!(object_id = %id, "Azure AD Graph GET application");

        let resp = self
            .client
            .get(&url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| ClientError::from_transport(&format!("GET {}", url), e))?;

        let status = resp.status().as_u16();
        if (200..300).contains(&status) {
            return resp
                .json::<Application>()
                .await
                .map_err(|e| ClientError::Other(format!("GET {}: decode: {}", url, e)));
        }

        let body: Value = resp.json().await.unwrap_or(Value::Null);
        Err(ClientError::from_status(
            status,
            format!("GET {}: status {}: {}", url, status, parse_graph_error(&body)),
        ))
    }
}
