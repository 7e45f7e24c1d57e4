use plagiarism_detector::config::AppConfig;
use serial_test::serial;
use std::env;
use std::fs;

// Helper to clear environment variables that might interfere with tests
fn clear_env_vars() {
    unsafe {
        env::set_var("ENGINE_TEST_MODE", "1");
        env::remove_var("ENGINE_SERVER__PORT");
        env::remove_var("CONFIG_FILE");
        env::remove_var("CHUNK_SIZE");
    }
}

#[test]
#[serial]
fn test_default_config() {
    clear_env_vars();

    let config = AppConfig::load();
    assert!(config.is_ok());
    let config = config.unwrap();
    assert_eq!(config.server.port, 3000); // Default
    assert_eq!(config.chunking.chunk_size, 100);
    assert_eq!(config.thresholds.similarity_critical, 0.95);
}

#[test]
#[serial]
fn test_env_override() {
    clear_env_vars();
    unsafe {
        env::set_var("ENGINE_SERVER__PORT", "9090");
    }

    let config = AppConfig::load().expect("Failed to load config");
    assert_eq!(config.server.port, 9090);

    clear_env_vars();
}

#[test]
#[serial]
fn test_direct_env_var_overrides_chunk_size() {
    clear_env_vars();
    unsafe {
        env::set_var("CHUNK_SIZE", "55");
    }

    let config = AppConfig::load().expect("Failed to load config");
    assert_eq!(config.chunking.chunk_size, 55);

    clear_env_vars();
}

#[test]
#[serial]
fn test_file_load() {
    clear_env_vars();

    let config_content = r#"
server:
  port: 7070
    "#;

    let file_path = "test_config.yaml";
    fs::write(file_path, config_content).expect("Failed to write temp config");

    unsafe {
        env::set_var("CONFIG_FILE", file_path);
    }

    let config = AppConfig::load().expect("Failed to load config from file");
    assert_eq!(config.server.port, 7070);

    fs::remove_file(file_path).unwrap();
    clear_env_vars();
}

#[test]
#[serial]
fn test_cwd_config_fallback() {
    clear_env_vars();

    let config_content = r#"
server:
  port: 6060
    "#;
    let cwd_path = "config.yaml";
    fs::write(cwd_path, config_content).expect("Failed to write ./config.yaml");

    let config = AppConfig::load().expect("Failed to load config");

    let result = std::panic::catch_unwind(|| {
        assert_eq!(config.server.port, 6060);
    });

    fs::remove_file(cwd_path).unwrap();

    if let Err(e) = result {
        std::panic::resume_unwind(e);
    }
}
