use anyhow::{Context, Result};
use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;

pub type Number = f32;

pub const EPSILON: f32 = 1e-6;

/// Fewest notes the projection and clustering steps can work with.
pub const MIN_NOTES: usize = 5;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 1234;
pub const DEFAULT_PERPLEXITY: f64 = 30.0;
pub const DEFAULT_ITERATIONS: usize = 1000;
pub const DEFAULT_LEARNING_RATE: f64 = 200.0;
pub const DEFAULT_MAX_FEATURES: usize = 100;
pub const DEFAULT_DBSCAN_EPS: Number = 0.5;
pub const DEFAULT_DBSCAN_MIN_SAMPLES: usize = 2;
pub const DEFAULT_SEED: u64 = 42;

#[derive(Deserialize)]
pub struct NotemapConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub perplexity: Option<f64>,
    pub iterations: Option<usize>,
    pub learning_rate: Option<f64>,
    pub max_features: Option<usize>,
    pub dbscan_eps: Option<Number>,
    pub dbscan_min_samples: Option<usize>,
    pub seed: Option<u64>,
}

impl NotemapConfig {
    pub fn try_from(config: &Config) -> Result<Self, ConfigError> {
        Ok(NotemapConfig {
            host: config.get("host").ok(),
            port: config.get("port").ok(),
            perplexity: config.get("perplexity").ok(),
            iterations: config.get("iterations").ok(),
            learning_rate: config.get("learning_rate").ok(),
            max_features: config.get("max_features").ok(),
            dbscan_eps: config.get("dbscan_eps").ok(),
            dbscan_min_samples: config.get("dbscan_min_samples").ok(),
            seed: config.get("seed").ok(),
        })
    }
}

/// Per-request projection settings as sent by the client.
///
/// Every field is optional; missing fields fall back to the configured
/// defaults for that request only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct ProcessSettings {
    pub perplexity: Option<f64>,
    pub iterations: Option<usize>,
    pub learning_rate: Option<f64>,
}

impl ProcessSettings {
    pub fn merged_over(&self, defaults: &ProjectionDefaults) -> ProjectionDefaults {
        ProjectionDefaults {
            perplexity: self.perplexity.unwrap_or(defaults.perplexity),
            iterations: self.iterations.unwrap_or(defaults.iterations),
            learning_rate: self.learning_rate.unwrap_or(defaults.learning_rate),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionDefaults {
    pub perplexity: f64,
    pub iterations: usize,
    pub learning_rate: f64,
}

impl Default for ProjectionDefaults {
    fn default() -> Self {
        Self {
            perplexity: DEFAULT_PERPLEXITY,
            iterations: DEFAULT_ITERATIONS,
            learning_rate: DEFAULT_LEARNING_RATE,
        }
    }
}

/// Resolved service settings. Built once at startup and shared read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub projection: ProjectionDefaults,
    pub max_features: usize,
    pub dbscan_eps: Number,
    pub dbscan_min_samples: usize,
    pub seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            projection: ProjectionDefaults::default(),
            max_features: DEFAULT_MAX_FEATURES,
            dbscan_eps: DEFAULT_DBSCAN_EPS,
            dbscan_min_samples: DEFAULT_DBSCAN_MIN_SAMPLES,
            seed: DEFAULT_SEED,
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self> {
        let config = Config::builder()
            .add_source(ConfigFile::with_name("notemap_config").required(false))
            .add_source(Environment::with_prefix("NOTEMAP"))
            .build()
            .context("Failed to load notemap configuration")?;

        let notemap_config = NotemapConfig::try_from(&config)?;
        Self::resolve(notemap_config)
    }

    pub fn resolve(raw: NotemapConfig) -> Result<Self> {
        let defaults = Settings::default();

        let settings = Self {
            host: raw.host.unwrap_or(defaults.host),
            port: raw.port.unwrap_or(defaults.port),
            projection: ProjectionDefaults {
                perplexity: raw.perplexity.unwrap_or(defaults.projection.perplexity),
                iterations: raw.iterations.unwrap_or(defaults.projection.iterations),
                learning_rate: raw
                    .learning_rate
                    .unwrap_or(defaults.projection.learning_rate),
            },
            max_features: raw.max_features.unwrap_or(defaults.max_features),
            dbscan_eps: raw.dbscan_eps.unwrap_or(defaults.dbscan_eps),
            dbscan_min_samples: raw.dbscan_min_samples.unwrap_or(defaults.dbscan_min_samples),
            seed: raw.seed.unwrap_or(defaults.seed),
        };

        if settings.max_features == 0 {
            anyhow::bail!("NOTEMAP_MAX_FEATURES must be at least 1.");
        }
        if settings.dbscan_eps <= 0.0 {
            anyhow::bail!("NOTEMAP_DBSCAN_EPS must be positive.");
        }

        Ok(settings)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn print_config(&self) {
        println!("host={}", self.host);
        println!("port={}", self.port);
        println!("perplexity={}", self.projection.perplexity);
        println!("iterations={}", self.projection.iterations);
        println!("learning_rate={}", self.projection.learning_rate);
        println!("max_features={}", self.max_features);
        println!("dbscan_eps={}", self.dbscan_eps);
        println!("dbscan_min_samples={}", self.dbscan_min_samples);
        println!("seed={}", self.seed);
    }
}
