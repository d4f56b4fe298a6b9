use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the metadata database
    pub data_dir: String,
    /// Directory holding the extracted asset trees
    pub projects_dir: String,
    /// Tenant all operations are scoped to
    pub tenant_id: String,
    /// Maximum accepted archive size in bytes
    pub max_upload_size: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            projects_dir: "./projects".to_string(),
            tenant_id: "default".to_string(),
            max_upload_size: 50 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string());

        let projects_dir =
            std::env::var("PROJECTS_DIR").unwrap_or_else(|_| "./projects".to_string());

        let tenant_id = std::env::var("TENANT_ID").unwrap_or_else(|_| "default".to_string());

        let max_upload_size = std::env::var("MAX_UPLOAD_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(50 * 1024 * 1024); // 50MB

        let config = Config {
            data_dir,
            projects_dir,
            tenant_id,
            max_upload_size,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.tenant_id.is_empty() {
            return Err(ConfigError::ValidationError(
                "TENANT_ID cannot be empty".to_string(),
            ));
        }

        // '/' is the store's composite-key separator.
        if self.tenant_id.contains('/') {
            return Err(ConfigError::ValidationError(
                "TENANT_ID cannot contain '/'".to_string(),
            ));
        }

        if self.max_upload_size == 0 {
            return Err(ConfigError::ValidationError(
                "MAX_UPLOAD_SIZE must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
