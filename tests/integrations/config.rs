use notifyhub::cli::Cli;
use notifyhub::config::{Config, OutputFormat};
use serial_test::serial;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn cli_for(path: PathBuf) -> Cli {
    Cli {
        config: Some(path),
        ..Cli::default()
    }
}

#[test]
#[serial]
fn test_file_values_override_defaults() {
    let file = config_file(
        r#"
log_level = "debug"

[dispatch]
concurrent = true

[sms]
provider = "vonage"
max_message_len = 140

[push]
enabled = true
app_id = "my-app"

[email.delivery]
max_attempts = 5
"#,
    );

    let config = Config::load(&cli_for(file.path().to_path_buf())).unwrap();

    assert_eq!(config.log_level, "debug");
    assert!(config.dispatch.concurrent);
    assert_eq!(config.sms.provider, "vonage");
    assert_eq!(config.sms.max_message_len, 140);
    // Untouched keys keep their defaults.
    assert_eq!(config.sms.min_destination_len, 10);
    assert!(!config.sms.delivery.auto_retry);
    assert!(config.push.enabled);
    assert_eq!(config.push.app_id, "my-app");
    assert_eq!(config.email.delivery.max_attempts, 5);
    assert_eq!(config.email.delivery.timeout_ms, 30_000);
    assert_eq!(config.output.format, OutputFormat::PlainText);
}

#[test]
#[serial]
fn test_env_overrides_file() {
    let file = config_file("[sms]\nfailure_rate = 0.2\n");
    std::env::set_var("NOTIFYHUB_SMS__FAILURE_RATE", "0.5");
    std::env::set_var("NOTIFYHUB_CHAT__ENABLED", "false");

    let result = Config::load(&cli_for(file.path().to_path_buf()));

    std::env::remove_var("NOTIFYHUB_SMS__FAILURE_RATE");
    std::env::remove_var("NOTIFYHUB_CHAT__ENABLED");
    let config = result.unwrap();
    assert_eq!(config.sms.failure_rate, 0.5);
    assert!(!config.chat.enabled);
}

#[test]
#[serial]
fn test_cli_flags_override_everything() {
    let file = config_file("log_level = \"warn\"\n\n[output]\nformat = \"PlainText\"\n");
    std::env::set_var("NOTIFYHUB_LOG_LEVEL", "error");

    let cli = Cli {
        log_level: Some("trace".to_string()),
        concurrent: true,
        json: true,
        ..cli_for(file.path().to_path_buf())
    };
    let result = Config::load(&cli);

    std::env::remove_var("NOTIFYHUB_LOG_LEVEL");
    let config = result.unwrap();
    assert_eq!(config.log_level, "trace");
    assert!(config.dispatch.concurrent);
    assert_eq!(config.output.format, OutputFormat::Json);
}

#[test]
#[serial]
fn test_missing_explicit_file_is_an_error() {
    let err = Config::load(&cli_for(PathBuf::from("/nonexistent/notifyhub.toml"))).unwrap_err();
    assert!(err.to_string().contains("configuration file not found"));
}

#[test]
#[serial]
fn test_out_of_range_failure_rate_is_rejected() {
    let file = config_file("[email]\nfailure_rate = 1.5\n");
    let err = Config::load(&cli_for(file.path().to_path_buf())).unwrap_err();
    assert!(err.to_string().contains("email.failure_rate"));
}

#[test]
#[serial]
fn test_malformed_file_is_an_error() {
    let file = config_file("[sms\nprovider = ");
    assert!(Config::load(&cli_for(file.path().to_path_buf())).is_err());
}
