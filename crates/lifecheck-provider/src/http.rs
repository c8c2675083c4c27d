use std::collections::BTreeMap;

use async_trait::async_trait;
use lifecheck_domain::ResourceType;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::ProviderError;
use crate::provider::{Created, Provider, ReadOutcome, ResolvedResource};

/// Env var consulted for a bearer token when none is configured explicitly.
const TOKEN_ENV: &str = "LIFECHECK_API_TOKEN";

/// Static configuration for the HTTP provider, injected at startup.
#[derive(Debug, Clone)]
pub struct HttpProviderConfig {
    /// Base URL of the remote resource API, without a trailing slash.
    pub base_url: String,
    /// Optional bearer token. Falls back to `LIFECHECK_API_TOKEN`, then to
    /// anonymous requests.
    pub token: Option<String>,
}

// ── Token provider ────────────────────────────────────────────────────────────

/// Abstraction over bearer token acquisition, so tests can inject one.
#[async_trait]
trait TokenProvider: Send + Sync {
    async fn token(&self) -> Result<String, ProviderError>;
}

struct StaticToken(String);

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> Result<String, ProviderError> {
        Ok(self.0.clone())
    }
}

// ── HttpProvider ──────────────────────────────────────────────────────────────

/// REST client for a remote declarative-resource API.
///
/// Wire contract:
/// - `POST {base}/{type}` with `{name, attrs}` → 201 `{id, attrs}`
/// - `GET {base}{id}` → 200 `{attrs}`, 404 when absent
/// - `PUT {base}{id}` with `{attrs}` → 200 `{attrs}`
/// - `DELETE {base}{id}` → 200/204
/// - `GET {base}/{type}` → 200 `{ids: [...]}`
///
/// Error payloads follow `{"error": {"code", "message"}}`.
pub struct HttpProvider {
    config: HttpProviderConfig,
    client: reqwest::Client,
    token: Option<Box<dyn TokenProvider>>,
}

impl HttpProvider {
    pub fn new(config: HttpProviderConfig) -> Self {
        let token: Option<Box<dyn TokenProvider>> = match &config.token {
            Some(t) => Some(Box::new(StaticToken(t.clone()))),
            None => std::env::var(TOKEN_ENV)
                .ok()
                .map(|t| Box::new(StaticToken(t)) as Box<dyn TokenProvider>),
        };
        Self {
            config,
            client: reqwest::Client::new(),
            token,
        }
    }

    async fn bearer(&self) -> Result<Option<String>, ProviderError> {
        match &self.token {
            Some(t) => t.token().await.map(Some),
            None => Ok(None),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    fn parse_error(body: &Value) -> String {
        let err = body.get("error").unwrap_or(body);
        let code = err["code"].as_str().unwrap_or("Unknown");
        let message = err["message"].as_str().unwrap_or("unknown error");
        format!("{}: {}", code, message)
    }

    fn attrs_from(body: &Value) -> BTreeMap<String, String> {
        body["attrs"]
            .as_object()
            .map(|m| {
                m.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default()
    }

    async fn send(
        &self,
        req: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<(u16, Value), ProviderError> {
        let req = match self.bearer().await? {
            Some(tok) => req.bearer_auth(tok),
            None => req,
        };
        let resp = req
            .send()
            .await
            .map_err(|e| ProviderError::ReadFailed(format!("{}: {}", what, e)))?;
        let status = resp.status().as_u16();
        let body: Value = resp.json().await.unwrap_or(Value::Null);
        Ok((status, body))
    }
}

#[async_trait]
impl Provider for HttpProvider {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn create(&self, resource: &ResolvedResource) -> Result<Created, ProviderError> {
        let url = self.url(&format!("/{}", resource.address.rtype));
        debug!(url, address = %resource.address, "HttpProvider: create");
        let body = json!({
            "name": resource.address.name.as_str(),
            "attrs": resource.attrs,
        });
        let (status, body) = self
            .send(self.client.post(&url).json(&body), "create")
            .await?;

        if !(200..300).contains(&status) {
            return Err(ProviderError::CreateFailed(format!(
                "{} ({}): {}",
                resource.address,
                status,
                Self::parse_error(&body)
            )));
        }

        let remote_id = body["id"]
            .as_str()
            .ok_or_else(|| {
                ProviderError::CreateFailed(format!("{}: no id in response", resource.address))
            })?
            .to_string();
        Ok(Created {
            remote_id,
            attrs: Self::attrs_from(&body),
        })
    }

    async fn update(
        &self,
        remote_id: &str,
        resource: &ResolvedResource,
    ) -> Result<BTreeMap<String, String>, ProviderError> {
        let url = self.url(remote_id);
        debug!(url, "HttpProvider: update");
        let body = json!({ "attrs": resource.attrs });
        let (status, body) = self.send(self.client.put(&url).json(&body), "update").await?;

        if !(200..300).contains(&status) {
            return Err(ProviderError::UpdateFailed(format!(
                "{} ({}): {}",
                remote_id,
                status,
                Self::parse_error(&body)
            )));
        }
        Ok(Self::attrs_from(&body))
    }

    async fn delete(&self, remote_id: &str) -> Result<(), ProviderError> {
        let url = self.url(remote_id);
        debug!(url, "HttpProvider: delete");
        let (status, body) = self.send(self.client.delete(&url), "delete").await?;

        // 404 on delete is already-gone, which is the desired end state.
        if !(200..300).contains(&status) && status != 404 {
            return Err(ProviderError::DeleteFailed(format!(
                "{} ({}): {}",
                remote_id,
                status,
                Self::parse_error(&body)
            )));
        }
        Ok(())
    }

    async fn read(&self, remote_id: &str) -> Result<ReadOutcome, ProviderError> {
        let url = self.url(remote_id);
        debug!(url, "HttpProvider: read");
        let (status, body) = self.send(self.client.get(&url), "read").await?;

        match status {
            200 => Ok(ReadOutcome::Present {
                attrs: Self::attrs_from(&body),
            }),
            404 => Ok(ReadOutcome::Absent),
            _ => Err(ProviderError::ReadFailed(format!(
                "{} ({}): {}",
                remote_id,
                status,
                Self::parse_error(&body)
            ))),
        }
    }

    async fn list(&self, rtype: &ResourceType) -> Result<Vec<String>, ProviderError> {
        let url = self.url(&format!("/{}", rtype));
        debug!(url, "HttpProvider: list");
        let (status, body) = self.send(self.client.get(&url), "list").await?;

        if status != 200 {
            return Err(ProviderError::ReadFailed(format!(
                "list {} ({}): {}",
                rtype,
                status,
                Self::parse_error(&body)
            )));
        }
        Ok(body["ids"]
            .as_array()
            .map(|a| {
                a.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifecheck_domain::Address;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> HttpProvider {
        HttpProvider::new(HttpProviderConfig {
            base_url: server.uri(),
            token: Some("fake-token".into()),
        })
    }

    fn resolved() -> ResolvedResource {
        let mut attrs = BTreeMap::new();
        attrs.insert("name".to_string(), "acctestdb1".to_string());
        attrs.insert("edition".to_string(), "Standard".to_string());
        ResolvedResource {
            address: Address::new("sql_database", "test"),
            attrs,
        }
    }

    #[tokio::test]
    async fn create_parses_remote_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sql_database"))
            .and(header("authorization", "Bearer fake-token"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "/groups/rg/servers/s/databases/acctestdb1",
                "attrs": { "name": "acctestdb1", "edition": "Standard" }
            })))
            .mount(&server)
            .await;

        let created = provider(&server).create(&resolved()).await.unwrap();
        assert_eq!(created.remote_id, "/groups/rg/servers/s/databases/acctestdb1");
        assert_eq!(created.attrs.get("edition").unwrap(), "Standard");
    }

    #[tokio::test]
    async fn read_present() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/groups/rg/servers/s/databases/db"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "attrs": { "edition": "Standard" }
            })))
            .mount(&server)
            .await;

        let outcome = provider(&server)
            .read("/groups/rg/servers/s/databases/db")
            .await
            .unwrap();
        match outcome {
            ReadOutcome::Present { attrs } => {
                assert_eq!(attrs.get("edition").unwrap(), "Standard")
            }
            ReadOutcome::Absent => panic!("expected Present"),
        }
    }

    #[tokio::test]
    async fn read_404_is_absent_not_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/groups/rg/servers/s/databases/gone"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": { "code": "NotFound", "message": "no such database" }
            })))
            .mount(&server)
            .await;

        let outcome = provider(&server)
            .read("/groups/rg/servers/s/databases/gone")
            .await
            .unwrap();
        assert!(!outcome.is_present());
    }

    #[tokio::test]
    async fn read_500_is_a_hard_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/groups/rg/servers/s/databases/db"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "error": { "code": "InternalError", "message": "backend down" }
            })))
            .mount(&server)
            .await;

        let err = provider(&server)
            .read("/groups/rg/servers/s/databases/db")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("InternalError: backend down"));
    }

    #[tokio::test]
    async fn create_failure_names_code_and_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sql_database"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": { "code": "InvalidEdition", "message": "edition 'Random' is not valid" }
            })))
            .mount(&server)
            .await;

        let err = provider(&server).create(&resolved()).await.unwrap_err();
        assert!(err.to_string().contains("InvalidEdition"));
        assert!(err.to_string().contains("Random"));
    }

    #[tokio::test]
    async fn delete_tolerates_already_gone() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/groups/rg"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": { "code": "NotFound", "message": "gone" }
            })))
            .mount(&server)
            .await;

        provider(&server).delete("/groups/rg").await.unwrap();
    }

    #[tokio::test]
    async fn list_returns_ids() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sql_database"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ids": ["/groups/rg/servers/s/databases/a", "/groups/rg/servers/s/databases/b"]
            })))
            .mount(&server)
            .await;

        let ids = provider(&server)
            .list(&ResourceType::new("sql_database"))
            .await
            .unwrap();
        assert_eq!(ids.len(), 2);
    }
}
