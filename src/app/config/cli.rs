use super::serde_helpers::{load_env_flag, load_env_path_opt, load_env_string_opt, load_env_var};
use super::{ConfigError, LogLevel};
use crate::app::logging_system::LogFormat;
use crate::reporter::ReporterOptions;
use crate::sender::{DEFAULT_TRAPPER_PORT, SenderConfig};
use crate::zabbix::ApiConfig;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

const DEFAULT_TEMPLATE: &str = "zabbix-reporter";

#[derive(Parser, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[command(author, version, about, long_about = None)]
#[serde(default)]
pub struct ReporterConfig {
    /// Server receiving trapper data (derived from the API URL if not provided)
    #[arg(long, env = "ZABBIX_SERVER")]
    pub zabbix_server: Option<String>,

    /// Trapper port of the server
    #[arg(long, env = "ZABBIX_PORT", default_value = "10051")]
    pub zabbix_port: u16,

    /// JSON-RPC endpoint of the frontend (defaults to http://{server}/zabbix/api_jsonrpc.php)
    #[arg(long, env = "ZABBIX_API_URL")]
    pub api_url: Option<String>,

    /// API user
    #[arg(long, env = "ZABBIX_API_USER")]
    pub api_user: Option<String>,

    /// API password
    #[arg(long, env = "ZABBIX_API_PASSWORD", hide_env_values = true)]
    #[serde(skip_serializing)]
    pub api_password: Option<String>,

    /// Template owning the items (defaults to the process name)
    #[arg(long, env = "ZABBIX_TEMPLATE")]
    pub template: Option<String>,

    /// Host name used for samples (defaults to the system hostname)
    #[arg(long, env = "ZABBIX_LOCAL_HOST")]
    pub local_host: Option<String>,

    /// Report interval in milliseconds
    #[arg(long, env = "REPORT_INTERVAL_MS", default_value = "5000")]
    pub report_interval_ms: u64,

    /// How long to wait for the trapper reply, in milliseconds
    #[arg(long, env = "SEND_TIMEOUT_MS", default_value = "500")]
    pub send_timeout_ms: u64,

    /// Management API request timeout in seconds
    #[arg(long, env = "API_TIMEOUT_SECS", default_value = "10")]
    pub api_timeout_secs: u64,

    /// Only send samples, never create hosts, templates or items
    #[arg(long, env = "DISABLE_PROVISIONING")]
    pub disable_provisioning: bool,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Emit log lines as JSON
    #[arg(long, env = "LOG_JSON")]
    pub log_json: bool,

    /// Configuration file path (optional)
    #[arg(long, env = "CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// Derived fields (not CLI arguments)
    #[serde(skip)]
    #[arg(skip)]
    pub report_interval: Duration,

    #[serde(skip)]
    #[arg(skip)]
    pub send_timeout: Duration,

    #[serde(skip)]
    #[arg(skip)]
    pub api_timeout: Duration,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            zabbix_server: None,
            zabbix_port: DEFAULT_TRAPPER_PORT,
            api_url: None,
            api_user: None,
            api_password: None,
            template: None,
            local_host: None,
            report_interval_ms: 5000,
            send_timeout_ms: 500,
            api_timeout_secs: 10,
            disable_provisioning: false,
            log_level: LogLevel::Info,
            log_json: false,
            config_file: None,
            report_interval: Duration::from_millis(5000),
            send_timeout: Duration::from_millis(500),
            api_timeout: Duration::from_secs(10),
        }
    }
}

impl ReporterConfig {
    /// Command line (with env fallbacks), then the config file for anything
    /// left unset.
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut config = ReporterConfig::parse_from(args);
        if let Some(path) = config.config_file.clone() {
            let file = Self::read_file(&path)?;
            config.fill_from(file);
        }
        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = ReporterConfig::default();

        load_env_string_opt("ZABBIX_SERVER", &mut config.zabbix_server);
        load_env_var("ZABBIX_PORT", &mut config.zabbix_port)?;
        load_env_string_opt("ZABBIX_API_URL", &mut config.api_url);
        load_env_string_opt("ZABBIX_API_USER", &mut config.api_user);
        load_env_string_opt("ZABBIX_API_PASSWORD", &mut config.api_password);
        load_env_string_opt("ZABBIX_TEMPLATE", &mut config.template);
        load_env_string_opt("ZABBIX_LOCAL_HOST", &mut config.local_host);
        load_env_var("REPORT_INTERVAL_MS", &mut config.report_interval_ms)?;
        load_env_var("SEND_TIMEOUT_MS", &mut config.send_timeout_ms)?;
        load_env_var("API_TIMEOUT_SECS", &mut config.api_timeout_secs)?;
        load_env_flag("DISABLE_PROVISIONING", &mut config.disable_provisioning)?;
        load_env_var("LOG_LEVEL", &mut config.log_level)?;
        load_env_flag("LOG_JSON", &mut config.log_json)?;
        load_env_path_opt("CONFIG_FILE", &mut config.config_file);

        if let Some(path) = config.config_file.clone() {
            let file = Self::read_file(&path)?;
            config.fill_from(file);
        }
        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::read_file(path)?;
        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    fn read_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Takes values from `base` for every field still unset or at its default.
    pub fn fill_from(&mut self, base: ReporterConfig) {
        let defaults = ReporterConfig::default();

        fill_opt(&mut self.zabbix_server, base.zabbix_server);
        fill_opt(&mut self.api_url, base.api_url);
        fill_opt(&mut self.api_user, base.api_user);
        fill_opt(&mut self.api_password, base.api_password);
        fill_opt(&mut self.template, base.template);
        fill_opt(&mut self.local_host, base.local_host);

        if self.zabbix_port == defaults.zabbix_port {
            self.zabbix_port = base.zabbix_port;
        }
        if self.report_interval_ms == defaults.report_interval_ms {
            self.report_interval_ms = base.report_interval_ms;
        }
        if self.send_timeout_ms == defaults.send_timeout_ms {
            self.send_timeout_ms = base.send_timeout_ms;
        }
        if self.api_timeout_secs == defaults.api_timeout_secs {
            self.api_timeout_secs = base.api_timeout_secs;
        }
        if self.log_level == defaults.log_level {
            self.log_level = base.log_level;
        }
        self.disable_provisioning |= base.disable_provisioning;
        self.log_json |= base.log_json;
    }

    /// Derives durations and resolves server, API URL, template and host defaults.
    pub fn post_process(&mut self) -> Result<(), ConfigError> {
        self.report_interval = Duration::from_millis(self.report_interval_ms);
        self.send_timeout = Duration::from_millis(self.send_timeout_ms);
        self.api_timeout = Duration::from_secs(self.api_timeout_secs);

        if self.zabbix_server.is_none()
            && let Some(api_url) = &self.api_url
        {
            let url = Url::parse(api_url).map_err(|e| {
                ConfigError::InvalidUrl(format!("Invalid API URL '{api_url}': {e}"))
            })?;
            self.zabbix_server = url.host_str().map(str::to_string);
        }

        if self.api_url.is_none()
            && let Some(server) = &self.zabbix_server
        {
            self.api_url = Some(ApiConfig::default_url(server));
        }

        if self.template.is_none() {
            self.template = Some(process_template_name());
        }

        if self.local_host.is_none() {
            self.local_host = hostname::get()
                .ok()
                .and_then(|h| h.into_string().ok())
                .filter(|h| !h.is_empty());
        }

        Ok(())
    }

    pub fn log_format(&self) -> LogFormat {
        if self.log_json {
            LogFormat::Json
        } else {
            LogFormat::Compact
        }
    }

    pub fn server(&self) -> Result<&str, ConfigError> {
        self.zabbix_server.as_deref().ok_or_else(|| {
            ConfigError::InvalidConfig(
                "Zabbix server not configured. Set ZABBIX_SERVER or ZABBIX_API_URL".to_string(),
            )
        })
    }

    pub fn template_name(&self) -> &str {
        self.template.as_deref().unwrap_or(DEFAULT_TEMPLATE)
    }

    pub fn local_host_name(&self) -> Result<&str, ConfigError> {
        self.local_host.as_deref().ok_or_else(|| {
            ConfigError::InvalidConfig(
                "Could not determine the local host name. Set ZABBIX_LOCAL_HOST".to_string(),
            )
        })
    }

    pub fn sender_config(&self) -> Result<SenderConfig, ConfigError> {
        Ok(SenderConfig {
            server: self.server()?.to_string(),
            port: self.zabbix_port,
            timeout: self.send_timeout,
            ..SenderConfig::default()
        })
    }

    /// `None` when provisioning is disabled.
    pub fn api_config(&self) -> Result<Option<ApiConfig>, ConfigError> {
        if self.disable_provisioning {
            return Ok(None);
        }
        let url = match &self.api_url {
            Some(url) => url.clone(),
            None => ApiConfig::default_url(self.server()?),
        };
        Ok(Some(ApiConfig {
            url,
            user: self.api_user.clone(),
            password: self.api_password.clone(),
            timeout: self.api_timeout,
            ..ApiConfig::default()
        }))
    }

    pub fn reporter_options(&self) -> Result<ReporterOptions, ConfigError> {
        Ok(ReporterOptions {
            local_host: self.local_host_name()?.to_string(),
            template: self.template_name().to_string(),
            sender: self.sender_config()?,
            api: self.api_config()?,
        })
    }
}

fn fill_opt(target: &mut Option<String>, base: Option<String>) {
    if target.is_none() {
        *target = base;
    }
}

/// Executable name with `.` replaced by `_`, the template name used when none
/// is configured.
pub fn process_template_name() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_TEMPLATE.to_string())
        .replace('.', "_")
}
