//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::MedscanConfig;
use super::secret::secret_string;
use crate::domain::errors::MedscanError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into MedscanConfig
/// 4. Applies environment variable overrides (MEDSCAN_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns [`MedscanError::Configuration`] if the file cannot be read, a
/// referenced variable is missing, parsing fails or validation fails.
///
/// # Examples
///
/// ```no_run
/// use medscan::config::loader::load_config;
///
/// let config = load_config("medscan.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<MedscanConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MedscanError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        MedscanError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    load_config_from_str(&contents)
}

/// Same as [`load_config`] but for TOML text already in memory
pub fn load_config_from_str(contents: &str) -> Result<MedscanConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: MedscanConfig = toml::from_str(&contents)
        .map_err(|e| MedscanError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        MedscanError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched so documented placeholders do not have
/// to be set.
///
/// # Errors
///
/// Returns an error naming every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| MedscanError::Configuration(format!("Invalid placeholder pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{var_name}}}");
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(MedscanError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using MEDSCAN_* prefix
///
/// Environment variables follow the pattern: MEDSCAN_<SECTION>_<KEY>
/// For example: MEDSCAN_EXTRACTION_MODEL, MEDSCAN_POSTGRESQL_CONNECTION_STRING
fn apply_env_overrides(config: &mut MedscanConfig) {
    // Application overrides
    if let Ok(val) = std::env::var("MEDSCAN_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Ok(val) = std::env::var("MEDSCAN_APPLICATION_DRY_RUN") {
        config.application.dry_run = val.parse().unwrap_or(false);
    }

    // Extraction overrides
    if let Ok(val) = std::env::var("MEDSCAN_EXTRACTION_BASE_URL") {
        config.extraction.base_url = val;
    }
    if let Ok(val) = std::env::var("MEDSCAN_EXTRACTION_MODEL") {
        config.extraction.model = val;
    }
    if let Ok(val) = std::env::var("MEDSCAN_EXTRACTION_TIMEOUT_SECONDS") {
        if let Ok(timeout) = val.parse() {
            config.extraction.timeout_seconds = timeout;
        }
    }
    if let Ok(val) = std::env::var("MEDSCAN_EXTRACTION_API_KEY_ENV") {
        config.extraction.api_key_env = val;
    }

    // PostgreSQL overrides; a connection string alone is enough to enable the section
    if let Ok(val) = std::env::var("MEDSCAN_POSTGRESQL_CONNECTION_STRING") {
        match config.postgresql {
            Some(ref mut pg) => pg.connection_string = secret_string(val),
            None => {
                let toml_fragment = format!("connection_string = {}", toml_quote(&val));
                if let Ok(pg) = toml::from_str(&toml_fragment) {
                    config.postgresql = Some(pg);
                }
            }
        }
    }
    if let Some(ref mut pg) = config.postgresql {
        if let Ok(val) = std::env::var("MEDSCAN_POSTGRESQL_MAX_CONNECTIONS") {
            if let Ok(max) = val.parse() {
                pg.max_connections = max;
            }
        }
        if let Ok(val) = std::env::var("MEDSCAN_POSTGRESQL_SSL_MODE") {
            pg.ssl_mode = val;
        }
    }

    // Logging overrides
    if let Ok(val) = std::env::var("MEDSCAN_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(true);
    }
    if let Ok(val) = std::env::var("MEDSCAN_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}

/// Quotes a value as a TOML basic string
fn toml_quote(value: &str) -> String {
    toml::Value::String(value.to_string()).to_string()
}
