use super::api::{ApiError, ZabbixApi};
use super::entities::{Application, Host, HostGroup, Item, Template};
use parking_lot::Mutex;
use reqwest::{Client, ClientBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub url: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub timeout: Duration,
    pub user_agent: String,
}

impl ApiConfig {
    /// Default JSON-RPC endpoint of a frontend installed under `/zabbix`.
    pub fn default_url(server: &str) -> String {
        format!("http://{server}/zabbix/api_jsonrpc.php")
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: Self::default_url("localhost"),
            user: None,
            password: None,
            timeout: Duration::from_secs(10),
            user_agent: format!("zabbix-reporter/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: &'a Value,
    id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    auth: Option<&'a str>,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: String,
}

/// JSON-RPC client for the management API.
///
/// Logs in lazily with `user.login` and keeps the session token; a call
/// rejected for an expired session logs in again and is retried once.
#[derive(Debug)]
pub struct JsonRpcClient {
    client: Client,
    config: ApiConfig,
    url: Url,
    auth: Mutex<Option<String>>,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let url: Url = config
            .url
            .parse()
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", config.url, e)))?;

        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            client,
            config,
            url,
            auth: Mutex::new(None),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Calls `method`, deserializing the `result` member.
    pub async fn call<P, R>(&self, method: &str, params: P) -> Result<R, ApiError>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let params = serde_json::to_value(params)
            .map_err(|e| ApiError::UnexpectedResponse(format!("unserializable params: {e}")))?;

        let token = self.session_token().await?;
        let result = match self.raw_call(method, &params, token.as_deref()).await {
            Err(e) if token.is_some() && e.is_session_error() => {
                debug!("API session expired, logging in again");
                *self.auth.lock() = None;
                let token = self.session_token().await?;
                self.raw_call(method, &params, token.as_deref()).await?
            }
            other => other?,
        };

        serde_json::from_value(result)
            .map_err(|e| ApiError::UnexpectedResponse(format!("{method}: {e}")))
    }

    async fn session_token(&self) -> Result<Option<String>, ApiError> {
        let cached = self.auth.lock().clone();
        if cached.is_some() {
            return Ok(cached);
        }

        let (Some(user), Some(password)) = (&self.config.user, &self.config.password) else {
            return Ok(None);
        };

        let params = json!({ "user": user, "password": password });
        let token = match self.raw_call("user.login", &params, None).await? {
            Value::String(token) => token,
            other => {
                return Err(ApiError::UnexpectedResponse(format!(
                    "user.login returned {other}"
                )));
            }
        };

        info!("Logged in to Zabbix API {} as {}", self.url, user);
        *self.auth.lock() = Some(token.clone());
        Ok(Some(token))
    }

    async fn raw_call(&self, method: &str, params: &Value, auth: Option<&str>) -> Result<Value, ApiError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            auth,
        };

        let response = self
            .client
            .post(self.url.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_http_error(e))?
            .error_for_status()?;

        let body: RpcResponse = response.json().await.map_err(|e| self.map_http_error(e))?;

        if let Some(error) = body.error {
            return Err(ApiError::Rpc {
                code: error.code,
                message: error.message,
                data: error.data,
            });
        }

        body.result
            .ok_or_else(|| ApiError::UnexpectedResponse(format!("{method}: missing result")))
    }

    fn map_http_error(&self, err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout(self.config.timeout)
        } else {
            ApiError::Http(err)
        }
    }

    async fn get_first<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<Option<T>, ApiError> {
        let found: Vec<T> = self.call(method, params).await?;
        Ok(found.into_iter().next())
    }

    async fn create<P: Serialize>(&self, method: &str, ids_key: &str, params: P) -> Result<Option<String>, ApiError> {
        let result: Value = self.call(method, params).await?;
        first_id(&result, ids_key)
    }
}

/// Pulls the first id out of a `{"<kind>ids": ["..."]}` result.
fn first_id(result: &Value, ids_key: &str) -> Result<Option<String>, ApiError> {
    let ids = result
        .get(ids_key)
        .and_then(Value::as_array)
        .ok_or_else(|| ApiError::UnexpectedResponse(format!("missing '{ids_key}' in {result}")))?;

    Ok(ids.first().and_then(|id| match id {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }))
}

impl ZabbixApi for JsonRpcClient {
    async fn get_host_group(&self, name: &str) -> Result<Option<HostGroup>, ApiError> {
        self.get_first(
            "hostgroup.get",
            json!({ "output": "extend", "filter": { "name": [name] } }),
        )
        .await
    }

    async fn create_host_group(&self, group: &HostGroup) -> Result<Option<String>, ApiError> {
        self.create("hostgroup.create", "groupids", group).await
    }

    async fn get_host(&self, name: &str) -> Result<Option<Host>, ApiError> {
        self.get_first(
            "host.get",
            json!({ "output": "extend", "filter": { "host": [name] } }),
        )
        .await
    }

    async fn create_host(&self, host: &Host) -> Result<Option<String>, ApiError> {
        self.create("host.create", "hostids", host).await
    }

    async fn get_template(&self, name: &str) -> Result<Option<Template>, ApiError> {
        self.get_first(
            "template.get",
            json!({
                "output": "extend",
                "filter": { "name": [name] },
                "selectHosts": ["hostid"]
            }),
        )
        .await
    }

    async fn create_template(&self, template: &Template) -> Result<Option<String>, ApiError> {
        self.create("template.create", "templateids", template).await
    }

    async fn update_template(&self, template: &Template) -> Result<Option<String>, ApiError> {
        let params = json!({
            "templateid": template.templateid,
            "hosts": template.hosts,
        });
        self.create("template.update", "templateids", params).await
    }

    async fn get_application(&self, name: &str, hostid: &str) -> Result<Option<Application>, ApiError> {
        self.get_first(
            "application.get",
            json!({
                "output": "extend",
                "hostids": [hostid],
                "filter": { "name": [name] }
            }),
        )
        .await
    }

    async fn create_application(&self, application: &Application) -> Result<Option<String>, ApiError> {
        self.create("application.create", "applicationids", application).await
    }

    async fn get_item(&self, key: &str, hostid: &str) -> Result<Option<Item>, ApiError> {
        self.get_first(
            "item.get",
            json!({
                "output": "extend",
                "hostids": [hostid],
                "filter": { "key_": [key] }
            }),
        )
        .await
    }

    async fn create_item(&self, item: &Item) -> Result<Option<String>, ApiError> {
        self.create("item.create", "itemids", item).await
    }
}
