use ask_widget::config::AppConfig;
use serial_test::serial;
use std::env;
use std::fs;
use std::io::Write;

const VARS: &[&str] = &[
    "ASK_SERVER__PORT",
    "ASK_LLM__MODEL",
    "CONFIG_FILE",
    "PORT",
    "STATIC_DIR",
    "RATE_LIMIT_ENABLED",
    "TIMEOUT_DISABLED",
    "LLM_BASE_URL",
    "LLM_MODEL",
    "LLM_API_KEY",
    "GROQ_API_KEY",
];

// Clear environment variables that might interfere with tests
fn clear_env_vars() {
    for var in VARS {
        unsafe {
            env::remove_var(var);
        }
    }
}

fn load(args: &[&str]) -> Result<AppConfig, config::ConfigError> {
    let mut argv = vec!["ask-widget"];
    argv.extend_from_slice(args);
    AppConfig::load_from_args(argv)
}

#[test]
#[serial]
fn test_default_config() {
    clear_env_vars();

    let config = load(&[]).expect("defaults should load");
    assert_eq!(config.server.port, 3000);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.static_dir, "static");
    assert_eq!(config.server.session_idle_secs, 1800);
    assert!(config.resilience.rate_limit_enabled);
    assert!(!config.resilience.timeout_disabled);
    assert_eq!(config.llm.base_url, "https://api.groq.com/openai");
    assert_eq!(config.llm.model, "llama-3.1-8b-instant");
    assert_eq!(config.llm.max_tokens, 300);
    assert!(config.llm.api_key.is_none());
}

#[test]
#[serial]
fn test_env_override() {
    clear_env_vars();
    unsafe {
        env::set_var("ASK_SERVER__PORT", "9090");
        env::set_var("ASK_LLM__MODEL", "llama-3.3-70b-versatile");
    }

    let config = load(&[]).expect("Failed to load config");
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.llm.model, "llama-3.3-70b-versatile");

    clear_env_vars();
}

#[test]
#[serial]
fn test_llm_env_vars() {
    clear_env_vars();
    unsafe {
        env::set_var("LLM_BASE_URL", "http://localhost:11434");
        env::set_var("GROQ_API_KEY", "gsk_test");
    }

    let config = load(&[]).expect("Failed to load config");
    assert_eq!(config.llm.base_url, "http://localhost:11434");
    let settings = config.llm.settings();
    assert_eq!(settings.api_key.as_deref(), Some("gsk_test"));
    assert_eq!(settings.provider, ask_widget::llm::Provider::Generic);

    // LLM_API_KEY wins over GROQ_API_KEY
    unsafe {
        env::set_var("LLM_API_KEY", "sk_other");
    }
    let config = load(&[]).expect("Failed to load config");
    assert_eq!(config.llm.api_key.as_deref(), Some("sk_other"));

    clear_env_vars();
}

#[test]
#[serial]
fn test_cli_overrides_env() {
    clear_env_vars();
    unsafe {
        env::set_var("ASK_SERVER__PORT", "9090");
    }

    let config = load(&["--port", "4040", "--rate-limit-enabled", "false"])
        .expect("Failed to load config");
    assert_eq!(config.server.port, 4040);
    assert!(!config.resilience.rate_limit_enabled);

    clear_env_vars();
}

#[test]
#[serial]
fn test_file_load() {
    clear_env_vars();

    let mut file = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .expect("Failed to create temp config");
    writeln!(
        file,
        "server:\n  port: 7070\n  page_title: Support\nllm:\n  temperature: 0.7"
    )
    .expect("Failed to write temp config");

    let path = file.path().to_str().expect("utf-8 path").to_string();
    let config = load(&["--config", &path]).expect("Failed to load config from file");
    assert_eq!(config.server.port, 7070);
    assert_eq!(config.server.page_title, "Support");
    assert!((config.llm.temperature - 0.7).abs() < f32::EPSILON);

    clear_env_vars();
}

#[test]
#[serial]
fn test_empty_model_rejected() {
    clear_env_vars();
    unsafe {
        env::set_var("ASK_LLM__MODEL", " ");
    }

    assert!(load(&[]).is_err());

    clear_env_vars();
}

#[test]
#[serial]
fn test_cwd_config_fallback() {
    clear_env_vars();

    let cwd_path = "config.yaml";
    fs::write(cwd_path, "server:\n  port: 6060\n").expect("Failed to write ./config.yaml");

    let config = load(&[]);

    fs::remove_file(cwd_path).unwrap();

    assert_eq!(config.expect("Failed to load config").server.port, 6060);
}
