use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

/// Registry storage and the shared secret guarding mutations.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_data_file")]
    pub data_file: String,
    #[serde(default)]
    pub seed_file: Option<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self { api_key: String::new(), data_file: default_data_file(), seed_file: None }
    }
}

fn default_data_file() -> String { "data/premium_users.json".into() }

/// `CONFIG_PATH`, or `config.toml` in the working directory.
pub fn default_config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string())
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

fn is_not_found(e: &anyhow::Error) -> bool {
    e.downcast_ref::<std::io::Error>()
        .is_some_and(|io| io.kind() == std::io::ErrorKind::NotFound)
}

fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

impl AppConfig {
    /// Load `config.toml` (or `CONFIG_PATH`), falling back to environment
    /// variables alone when the file does not exist, then validate.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = Self::load_or_env_with(&default_config_path(), process_env)?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Read `path`; only a missing file falls back to `lookup`. A file that
    /// exists but cannot be read or parsed is an error.
    pub fn load_or_env_with<F>(path: &str, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        match load_from_file(path) {
            Ok(cfg) => Ok(cfg),
            Err(e) if is_not_found(&e) => Ok(Self::from_env_with(lookup)),
            Err(e) => Err(e.context(format!("failed to load config from {path}"))),
        }
    }

    /// Build a config purely from `SERVER_*`, `TOKIO_WORKER_THREADS` and `REGISTRY_*` variables.
    pub fn from_env_with<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ServerConfig::default();
        let server = ServerConfig {
            host: lookup("SERVER_HOST").unwrap_or(defaults.host),
            port: lookup("SERVER_PORT").and_then(|p| p.parse::<u16>().ok()).unwrap_or(defaults.port),
            worker_threads: lookup("TOKIO_WORKER_THREADS").and_then(|v| v.parse::<usize>().ok()),
        };
        let registry = RegistryConfig {
            api_key: lookup("REGISTRY_API_KEY").unwrap_or_default(),
            data_file: lookup("REGISTRY_DATA_FILE").unwrap_or_else(default_data_file),
            seed_file: lookup("REGISTRY_SEED_FILE"),
        };
        Self { server, registry }
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.normalize_and_validate_with(process_env)
    }

    pub fn normalize_and_validate_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.server.normalize()?;
        self.registry.normalize_from_env(&lookup);
        self.registry.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl RegistryConfig {
    pub fn normalize_from_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // secrets may live outside the TOML file
        if self.api_key.trim().is_empty() {
            if let Some(key) = lookup("REGISTRY_API_KEY") {
                self.api_key = key;
            }
        }
        if self.data_file.trim().is_empty() {
            self.data_file = default_data_file();
        }
        if self.seed_file.as_deref().is_some_and(|s| s.trim().is_empty()) {
            self.seed_file = None;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(anyhow!(
                "registry.api_key is empty; set it in config.toml or REGISTRY_API_KEY"
            ));
        }
        Ok(())
    }
}
