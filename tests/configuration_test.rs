use serial_test::serial;
use std::env;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;
use zabbix_reporter::app::LogFormat;
use zabbix_reporter::app::config::{ConfigError, LogLevel};
use zabbix_reporter::ReporterConfig;

const ENV_VARS: [&str; 14] = [
    "ZABBIX_SERVER",
    "ZABBIX_PORT",
    "ZABBIX_API_URL",
    "ZABBIX_API_USER",
    "ZABBIX_API_PASSWORD",
    "ZABBIX_TEMPLATE",
    "ZABBIX_LOCAL_HOST",
    "REPORT_INTERVAL_MS",
    "SEND_TIMEOUT_MS",
    "API_TIMEOUT_SECS",
    "DISABLE_PROVISIONING",
    "LOG_LEVEL",
    "LOG_JSON",
    "CONFIG_FILE",
];

fn clean_env() {
    unsafe {
        for var in ENV_VARS {
            env::remove_var(var);
        }
    }
}

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
#[serial]
fn test_config_from_args() {
    clean_env();

    let config = ReporterConfig::from_args([
        "zabbix-reporter",
        "--zabbix-server",
        "10.0.0.1",
        "--zabbix-port",
        "10052",
        "--template",
        "Checkout",
        "--local-host",
        "10.0.0.5",
        "--report-interval-ms",
        "1000",
        "--log-level",
        "debug",
        "--log-json",
    ])
    .unwrap();

    assert_eq!(config.server().unwrap(), "10.0.0.1");
    assert_eq!(config.zabbix_port, 10052);
    assert_eq!(config.template_name(), "Checkout");
    assert_eq!(config.local_host_name().unwrap(), "10.0.0.5");
    assert_eq!(config.report_interval, Duration::from_millis(1000));
    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.log_format(), LogFormat::Json);
    assert_eq!(
        config.api_url.as_deref(),
        Some("http://10.0.0.1/zabbix/api_jsonrpc.php")
    );
}

#[test]
#[serial]
fn test_reporter_options_from_args() {
    clean_env();

    let config = ReporterConfig::from_args([
        "zabbix-reporter",
        "--api-url",
        "https://monitor.example.com/api_jsonrpc.php",
        "--api-user",
        "reporter",
        "--api-password",
        "secret",
        "--local-host",
        "10.0.0.5",
        "--send-timeout-ms",
        "250",
    ])
    .unwrap();

    let options = config.reporter_options().unwrap();
    assert_eq!(options.local_host, "10.0.0.5");
    assert_eq!(options.sender.server, "monitor.example.com");
    assert_eq!(options.sender.port, 10051);
    assert_eq!(options.sender.timeout, Duration::from_millis(250));

    let api = options.api.unwrap();
    assert_eq!(api.url, "https://monitor.example.com/api_jsonrpc.php");
    assert_eq!(api.user.as_deref(), Some("reporter"));
    assert_eq!(api.password.as_deref(), Some("secret"));
    assert_eq!(api.timeout, Duration::from_secs(10));
}

#[test]
#[serial]
fn test_disabled_provisioning_has_no_api() {
    clean_env();

    let config = ReporterConfig::from_args([
        "zabbix-reporter",
        "--zabbix-server",
        "10.0.0.1",
        "--local-host",
        "10.0.0.5",
        "--disable-provisioning",
    ])
    .unwrap();

    let options = config.reporter_options().unwrap();
    assert!(options.api.is_none());
    assert_eq!(options.sender.server, "10.0.0.1");
}

#[test]
#[serial]
fn test_config_from_env() {
    clean_env();
    unsafe {
        env::set_var("ZABBIX_SERVER", "zabbix.internal");
        env::set_var("ZABBIX_TEMPLATE", "Billing");
        env::set_var("ZABBIX_LOCAL_HOST", "10.1.2.3");
        env::set_var("REPORT_INTERVAL_MS", "15000");
        env::set_var("DISABLE_PROVISIONING", "yes");
        env::set_var("LOG_LEVEL", "warning");
    }

    let config = ReporterConfig::from_env().unwrap();
    clean_env();

    assert_eq!(config.server().unwrap(), "zabbix.internal");
    assert_eq!(config.template_name(), "Billing");
    assert_eq!(config.report_interval, Duration::from_secs(15));
    assert!(config.disable_provisioning);
    assert_eq!(config.log_level, LogLevel::Warn);
}

#[test]
#[serial]
fn test_invalid_env_value_is_rejected() {
    clean_env();
    unsafe {
        env::set_var("ZABBIX_SERVER", "zabbix.internal");
        env::set_var("ZABBIX_PORT", "not-a-port");
    }

    let result = ReporterConfig::from_env();
    clean_env();

    assert!(matches!(result, Err(ConfigError::EnvError(_))));
}

#[test]
#[serial]
fn test_config_from_file() {
    clean_env();
    let file = write_config(
        r#"
zabbix_server = "10.9.9.9"
zabbix_port = 10053
template = "Inventory"
local_host = "10.0.0.7"
report_interval_ms = 2500
log_level = "trace"
"#,
    );

    let config = ReporterConfig::from_file(file.path()).unwrap();

    assert_eq!(config.server().unwrap(), "10.9.9.9");
    assert_eq!(config.zabbix_port, 10053);
    assert_eq!(config.template_name(), "Inventory");
    assert_eq!(config.report_interval, Duration::from_millis(2500));
    assert_eq!(config.send_timeout, Duration::from_millis(500));
    assert_eq!(config.log_level, LogLevel::Trace);
}

#[test]
#[serial]
fn test_command_line_wins_over_file() {
    clean_env();
    let file = write_config(
        r#"
zabbix_server = "10.9.9.9"
template = "FromFile"
local_host = "10.0.0.7"
report_interval_ms = 2500
"#,
    );
    let path = file.path().to_string_lossy().into_owned();

    let config = ReporterConfig::from_args([
        "zabbix-reporter",
        "--template",
        "FromArgs",
        "--config-file",
        path.as_str(),
    ])
    .unwrap();

    assert_eq!(config.template_name(), "FromArgs");
    assert_eq!(config.server().unwrap(), "10.9.9.9");
    assert_eq!(config.report_interval, Duration::from_millis(2500));
}

#[test]
#[serial]
fn test_missing_server_is_rejected() {
    clean_env();

    let result = ReporterConfig::from_args(["zabbix-reporter", "--local-host", "10.0.0.5"]);
    assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));
}

#[test]
#[serial]
fn test_validation_errors() {
    clean_env();

    let cases: [&[&str]; 4] = [
        &["--zabbix-server", "10.0.0.1", "--report-interval-ms", "0"],
        &["--zabbix-server", "10.0.0.1", "--zabbix-port", "0"],
        &["--zabbix-server", "10.0.0.1", "--api-user", "reporter"],
        &["--api-url", "ftp://10.0.0.1/api_jsonrpc.php"],
    ];

    for args in cases {
        let argv = std::iter::once("zabbix-reporter").chain(args.iter().copied());
        let result = ReporterConfig::from_args(argv);
        assert!(result.is_err(), "accepted {args:?}");
    }
}

#[test]
#[serial]
fn test_unreadable_file_is_a_file_error() {
    clean_env();

    let result = ReporterConfig::from_file("/nonexistent/zabbix-reporter.toml");
    assert!(matches!(result, Err(ConfigError::FileError(_))));
}

#[test]
#[serial]
fn test_password_is_not_serialized() {
    clean_env();

    let config = ReporterConfig::from_args([
        "zabbix-reporter",
        "--zabbix-server",
        "10.0.0.1",
        "--api-user",
        "reporter",
        "--api-password",
        "secret",
    ])
    .unwrap();

    let rendered = toml::to_string(&config).unwrap();
    assert!(rendered.contains("reporter"));
    assert!(!rendered.contains("secret"));
}
