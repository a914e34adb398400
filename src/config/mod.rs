use anyhow::Result;
use dotenvy::dotenv;
use serde::Deserialize;

fn default_portal_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_log_file() -> String {
    "freelance_manager.log".to_string()
}

fn default_report_dir() -> String {
    "reports".to_string()
}

/// Configuration for the application
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,
    /// Base URL that share links are built on
    #[serde(default = "default_portal_base_url")]
    pub portal_base_url: String,
    /// File that tracing output is appended to
    #[serde(default = "default_log_file")]
    pub log_file: String,
    /// Default directory for portal reports written with `--output`
    #[serde(default = "default_report_dir")]
    pub report_dir: String,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// This function will:
    /// 1. Load variables from .env file if it exists
    /// 2. Deserialize environment variables into Config struct
    pub fn load() -> Result<Self> {
        dotenv().ok();

        let config = envy::from_env::<Config>()?;

        Ok(config)
    }

    /// Build a config from an explicit list of variables, as `envy` would see them
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::from_iter::<_, Config>(vars)?)
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn portal_base_url(&self) -> &str {
        &self.portal_base_url
    }
}

/// Initialize environment variables and load configuration.
///
/// A database URL passed on the command line wins over the environment.
pub fn init(database_url: Option<String>) -> Result<Config> {
    dotenv().ok();

    let config = match database_url {
        Some(url) => {
            let mut vars: Vec<(String, String)> = std::env::vars()
                .filter(|(key, _)| key != "DATABASE_URL")
                .collect();
            vars.push(("DATABASE_URL".to_string(), url));
            Config::from_vars(vars)?
        }
        None => Config::load()?,
    };

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_fill_optional_fields() {
        let config = Config::from_vars(vars(&[("DATABASE_URL", "postgres://localhost/freelance")]))
            .expect("config should load");

        assert_eq!(config.database_url(), "postgres://localhost/freelance");
        assert_eq!(config.portal_base_url(), "http://localhost:3000");
        assert_eq!(config.log_file, "freelance_manager.log");
        assert_eq!(config.report_dir, "reports");
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = Config::from_vars(vars(&[
            ("DATABASE_URL", "postgres://db/app"),
            ("PORTAL_BASE_URL", "https://portal.example.com"),
            ("LOG_FILE", "/tmp/fm.log"),
        ]))
        .expect("config should load");

        assert_eq!(config.portal_base_url(), "https://portal.example.com");
        assert_eq!(config.log_file, "/tmp/fm.log");
    }

    #[test]
    fn missing_database_url_is_an_error() {
        assert!(Config::from_vars(vars(&[("LOG_FILE", "x.log")])).is_err());
    }
}
