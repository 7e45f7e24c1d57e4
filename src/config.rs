use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Switch chunker defaults to the legacy 250/50/50 preset (§9).
    #[arg(long, env = "CHUNK_PRESET")]
    pub preset: Option<String>,

    /// Base URL of the embedder service.
    #[arg(long, env = "EMBEDDER_BASE_URL")]
    pub embedder_base_url: Option<String>,

    /// Base URL of the vector store service.
    #[arg(long, env = "VECTOR_STORE_BASE_URL")]
    pub vector_store_base_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub thresholds: ThresholdConfig,
    pub embedder: EmbedderConfig,
    pub vector_store: VectorStoreConfig,
    pub timeouts: TimeoutConfig,
    pub pdf_ingest: PdfIngestConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

/// §4.1 chunker parameters. The two presets named in §9 are exposed via
/// `--preset legacy-large` rather than as separate config structs.
#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub min_chunk_size: usize,
}

/// §6 defaults governing kNN retrieval and aggregation.
#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    pub top_k_results: usize,
    pub min_score_threshold: f64,
    pub max_results_per_source: usize,
    pub max_parallel_searches: usize,
}

/// §6/§4.7 severity-band thresholds.
#[derive(Debug, Deserialize, Clone)]
pub struct ThresholdConfig {
    pub similarity_low: f64,
    pub similarity_medium: f64,
    pub similarity_high: f64,
    pub similarity_critical: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbedderConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub dimensions: usize,
    pub batch_size: usize,
    pub max_attempts: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct VectorStoreConfig {
    pub base_url: String,
    pub index_name: String,
    pub api_key: Option<String>,
}

/// §5 timeout defaults.
#[derive(Debug, Deserialize, Clone)]
pub struct TimeoutConfig {
    pub embedder_call_secs: u64,
    pub knn_call_secs: u64,
    pub check_request_secs: u64,
}

impl TimeoutConfig {
    pub fn embedder_call(&self) -> Duration {
        Duration::from_secs(self.embedder_call_secs)
    }

    pub fn knn_call(&self) -> Duration {
        Duration::from_secs(self.knn_call_secs)
    }

    pub fn check_request(&self) -> Duration {
        Duration::from_secs(self.check_request_secs)
    }
}

/// §6 PDF ingest adapter: object store endpoint plus the segment-filtering
/// rules applied before text reaches the standard ingest path.
#[derive(Debug, Deserialize, Clone)]
pub struct PdfIngestConfig {
    pub object_store_endpoint: String,
    pub object_store_region: String,
    pub min_segment_chars: usize,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let args: Vec<String> = env::args().collect();
        if cfg!(test) || env::var("ENGINE_TEST_MODE").is_ok() {
            Self::load_from_args(vec!["app".to_string()])
        } else {
            Self::load_from_args(args)
        }
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli = match Cli::try_parse_from(args) {
            Ok(c) => c,
            Err(e) => {
                println!("Warning: Failed to parse CLI args: {e}");
                Cli {
                    config: None,
                    port: None,
                    preset: None,
                    embedder_base_url: None,
                    vector_store_base_url: None,
                }
            }
        };

        let legacy_preset = cli
            .preset
            .as_deref()
            .map(|p| p.eq_ignore_ascii_case("legacy-large"))
            .unwrap_or(false);
        let (chunk_size, chunk_overlap, min_chunk_size) = if legacy_preset {
            (250, 50, 50)
        } else {
            (100, 20, 30)
        };

        let mut builder = Config::builder();

        builder = builder
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("chunking.chunk_size", chunk_size)?
            .set_default("chunking.chunk_overlap", chunk_overlap)?
            .set_default("chunking.min_chunk_size", min_chunk_size)?
            .set_default("retrieval.top_k_results", 10)?
            .set_default("retrieval.min_score_threshold", 0.50)?
            .set_default("retrieval.max_results_per_source", 3)?
            .set_default("retrieval.max_parallel_searches", num_cpus::get() as i64)?
            .set_default("thresholds.similarity_low", 0.50)?
            .set_default("thresholds.similarity_medium", 0.70)?
            .set_default("thresholds.similarity_high", 0.85)?
            .set_default("thresholds.similarity_critical", 0.95)?
            .set_default("embedder.base_url", "http://localhost:8081")?
            .set_default("embedder.api_key", None::<String>)?
            .set_default("embedder.dimensions", 768)?
            .set_default("embedder.batch_size", 32)?
            .set_default("embedder.max_attempts", 3)?
            .set_default("vector_store.base_url", "http://localhost:9200")?
            .set_default("vector_store.index_name", "plagiarism-documents")?
            .set_default("vector_store.api_key", None::<String>)?
            .set_default("timeouts.embedder_call_secs", 60)?
            .set_default("timeouts.knn_call_secs", 10)?
            .set_default("timeouts.check_request_secs", 300)?
            .set_default("pdf_ingest.object_store_endpoint", "http://localhost:9000")?
            .set_default("pdf_ingest.object_store_region", "us-east-1")?
            .set_default("pdf_ingest.min_segment_chars", 200)?;

        let explicit_config = cli.config.clone().or_else(|| env::var("CONFIG_FILE").ok());
        let config_path = if let Some(path) = explicit_config {
            Some(path)
        } else {
            let cwd_config = "config.yaml";
            if std::path::Path::new(cwd_config).exists() {
                Some(cwd_config.to_string())
            } else {
                let home = env::var("HOME").unwrap_or_else(|_| ".".into());
                let home_config = format!("{home}/.plagiarism-detector/config.yaml");
                if std::path::Path::new(&home_config).exists() {
                    Some(home_config)
                } else {
                    None
                }
            }
        };

        if let Some(path) = config_path {
            println!("Loading config from: {path}");
            builder = builder.add_source(File::with_name(&path));
        }

        builder = builder.add_source(
            Environment::with_prefix("ENGINE")
                .separator("__")
                .try_parsing(true),
        );

        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", port)?;
        }
        if let Some(url) = cli.embedder_base_url {
            builder = builder.set_override("embedder.base_url", url)?;
        }
        if let Some(url) = cli.vector_store_base_url {
            builder = builder.set_override("vector_store.base_url", url)?;
        }

        // Direct (unprefixed) env vars named in §6, applied as overrides so
        // they win over config-file values but not explicit CLI flags.
        for (env_key, config_key) in [
            ("CHUNK_SIZE", "chunking.chunk_size"),
            ("CHUNK_OVERLAP", "chunking.chunk_overlap"),
            ("MIN_CHUNK_SIZE", "chunking.min_chunk_size"),
            ("TOP_K_RESULTS", "retrieval.top_k_results"),
            ("MAX_RESULTS_PER_SOURCE", "retrieval.max_results_per_source"),
            ("EMBEDDING_DIMS", "embedder.dimensions"),
        ] {
            if let Ok(val) = env::var(env_key) {
                if let Ok(parsed) = val.parse::<i64>() {
                    builder = builder.set_override(config_key, parsed)?;
                }
            }
        }
        for (env_key, config_key) in [
            ("MIN_SCORE_THRESHOLD", "retrieval.min_score_threshold"),
            ("SIMILARITY_CRITICAL", "thresholds.similarity_critical"),
            ("SIMILARITY_HIGH", "thresholds.similarity_high"),
            ("SIMILARITY_MEDIUM", "thresholds.similarity_medium"),
            ("SIMILARITY_LOW", "thresholds.similarity_low"),
        ] {
            if let Ok(val) = env::var(env_key) {
                if let Ok(parsed) = val.parse::<f64>() {
                    builder = builder.set_override(config_key, parsed)?;
                }
            }
        }

        let cfg = builder.build()?;
        cfg.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_preset_matches_smaller_chunk_sizes() {
        let config = AppConfig::load_from_args(vec!["app".to_string()]).unwrap();
        assert_eq!(config.chunking.chunk_size, 100);
        assert_eq!(config.chunking.chunk_overlap, 20);
        assert_eq!(config.chunking.min_chunk_size, 30);
    }

    #[test]
    fn legacy_preset_matches_larger_chunk_sizes() {
        let config =
            AppConfig::load_from_args(vec!["app".to_string(), "--preset".to_string(), "legacy-large".to_string()])
                .unwrap();
        assert_eq!(config.chunking.chunk_size, 250);
        assert_eq!(config.chunking.chunk_overlap, 50);
        assert_eq!(config.chunking.min_chunk_size, 50);
    }

    #[test]
    fn env_var_overrides_chunk_size() {
        // SAFETY: tests in this module run single-threaded via the default
        // test harness for this file; no other test reads CHUNK_SIZE.
        unsafe {
            env::set_var("CHUNK_SIZE", "42");
        }
        let config = AppConfig::load_from_args(vec!["app".to_string()]).unwrap();
        assert_eq!(config.chunking.chunk_size, 42);
        unsafe {
            env::remove_var("CHUNK_SIZE");
        }
    }
}
