use super::{ConfigError, ReporterConfig};
use url::Url;

impl ReporterConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let server = self.server()?;
        if server.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "Zabbix server must not be empty".to_string(),
            ));
        }

        if let Some(api_url) = &self.api_url {
            let url = Url::parse(api_url).map_err(|e| {
                ConfigError::InvalidUrl(format!("Invalid API URL '{api_url}': {e}"))
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ConfigError::InvalidUrl(format!(
                    "API URL must use http or https: {api_url}"
                )));
            }
        }

        if self.zabbix_port == 0 {
            return Err(ConfigError::InvalidConfig(
                "Zabbix port must be greater than 0".to_string(),
            ));
        }

        if self.report_interval_ms == 0 {
            return Err(ConfigError::InvalidConfig(
                "Report interval must be greater than 0".to_string(),
            ));
        }

        if self.send_timeout_ms == 0 {
            return Err(ConfigError::InvalidConfig(
                "Send timeout must be greater than 0".to_string(),
            ));
        }

        if self.api_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "API timeout must be greater than 0".to_string(),
            ));
        }

        if self.template_name().trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "Template name must not be empty".to_string(),
            ));
        }

        if self.api_user.is_some() != self.api_password.is_some() {
            return Err(ConfigError::InvalidConfig(
                "API user and password must be set together".to_string(),
            ));
        }

        Ok(())
    }
}
