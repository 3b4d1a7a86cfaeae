use super::entities::{Application, Host, HostGroup, Item, Template};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API request timed out after {0:?}")]
    Timeout(Duration),
    #[error("API error {code}: {message} {data}")]
    Rpc {
        code: i64,
        message: String,
        data: String,
    },
    #[error("Unexpected API response: {0}")]
    UnexpectedResponse(String),
}

impl ApiError {
    /// The server dropped or never accepted our session token.
    pub fn is_session_error(&self) -> bool {
        match self {
            ApiError::Rpc { message, data, .. } => {
                let text = format!("{message} {data}").to_lowercase();
                text.contains("re-login") || text.contains("not authori") || text.contains("session terminated")
            }
            _ => false,
        }
    }
}

/// The handful of get-or-create calls the synchronizer needs from the
/// management API. Lookups return `None` when nothing matches; creations
/// return the new object's id when the server reported one.
pub trait ZabbixApi: Send + Sync {
    fn get_host_group(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<HostGroup>, ApiError>> + Send;

    fn create_host_group(
        &self,
        group: &HostGroup,
    ) -> impl Future<Output = Result<Option<String>, ApiError>> + Send;

    fn get_host(&self, name: &str) -> impl Future<Output = Result<Option<Host>, ApiError>> + Send;

    fn create_host(&self, host: &Host) -> impl Future<Output = Result<Option<String>, ApiError>> + Send;

    /// Looks a template up by visible name, including its linked hosts.
    fn get_template(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Template>, ApiError>> + Send;

    fn create_template(
        &self,
        template: &Template,
    ) -> impl Future<Output = Result<Option<String>, ApiError>> + Send;

    /// Replaces the template's linked hosts with `template.hosts`.
    fn update_template(
        &self,
        template: &Template,
    ) -> impl Future<Output = Result<Option<String>, ApiError>> + Send;

    fn get_application(
        &self,
        name: &str,
        hostid: &str,
    ) -> impl Future<Output = Result<Option<Application>, ApiError>> + Send;

    fn create_application(
        &self,
        application: &Application,
    ) -> impl Future<Output = Result<Option<String>, ApiError>> + Send;

    fn get_item(
        &self,
        key: &str,
        hostid: &str,
    ) -> impl Future<Output = Result<Option<Item>, ApiError>> + Send;

    fn create_item(&self, item: &Item) -> impl Future<Output = Result<Option<String>, ApiError>> + Send;
}
