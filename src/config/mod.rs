use serde::Deserialize;

static CONFIG: OnceCell<Config> = OnceCell::const_new();

mod config_dir;
pub use config_dir::{find_config_file, read_config_from};

mod error;
pub use error::{ConfigError, ConfigResult};
use tokio::sync::OnceCell;

use crate::grading::ScoringPolicy;

#[derive(Debug, Deserialize)]
pub struct Config {
    host: Host,
    app: App,
    admin: Admin,
    #[serde(default)]
    grading: Grading,
}

#[derive(Debug, Deserialize)]
pub struct Host {
    bindto: String,
}

#[derive(Debug, Deserialize)]
pub struct App {
    jwt: String,
    database_uri: String,
    #[serde(default)]
    docs: bool,
    #[serde(default = "default_static_dir")]
    static_dir: String,
    #[serde(default = "default_session_hours")]
    session_hours: i64,
}

/// Account created on start-up if missing.
#[derive(Debug, Deserialize)]
pub struct Admin {
    username: String,
    password: String,
}

#[derive(Debug, Deserialize)]
pub struct Grading {
    #[serde(default = "default_negative_marking")]
    negative_marking: bool,
}

fn default_static_dir() -> String {
    String::from("./frontend/dist")
}

fn default_session_hours() -> i64 {
    24
}

fn default_negative_marking() -> bool {
    true
}

impl Default for Grading {
    fn default() -> Self {
        Self {
            negative_marking: default_negative_marking(),
        }
    }
}

impl Config {
    #[tracing::instrument]
    pub async fn get_or_init(use_local: bool) -> &'static Config {
        CONFIG
            .get_or_init(|| async {
                match Self::load_from(&find_config_file(use_local)) {
                    Ok(c) => c,
                    Err(ConfigError::ConfigNotFound) => {
                        tracing::error!("Config not found.");
                        std::process::exit(1);
                    }
                    Err(e) => {
                        crate::error::log_error(&e);
                        std::process::exit(1);
                    }
                }
            })
            .await
    }

    pub fn load_from(path: &std::path::Path) -> ConfigResult<Self> {
        let bytes = read_config_from(path)?;
        Self::from_slice(&bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> ConfigResult<Self> {
        let config: Self = toml::from_slice(bytes)?;
        Ok(config)
    }

    #[inline]
    pub fn host(&self) -> &Host {
        &self.host
    }

    #[inline]
    pub fn app(&self) -> &App {
        &self.app
    }

    #[inline]
    pub fn admin(&self) -> &Admin {
        &self.admin
    }

    #[inline]
    pub fn grading(&self) -> &Grading {
        &self.grading
    }
}

impl Host {
    #[inline]
    pub fn bindto(&self) -> &str {
        &self.bindto
    }
}

impl App {
    #[inline]
    pub fn jwt(&self) -> &str {
        &self.jwt
    }

    #[inline]
    pub fn database_uri(&self) -> &str {
        &self.database_uri
    }

    #[inline]
    pub fn docs(&self) -> bool {
        self.docs
    }

    #[inline]
    pub fn static_dir(&self) -> &str {
        &self.static_dir
    }

    #[inline]
    pub fn session_hours(&self) -> i64 {
        self.session_hours
    }
}

impl Admin {
    #[inline]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[inline]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl Grading {
    pub fn policy(&self) -> ScoringPolicy {
        ScoringPolicy {
            negative_marking: self.negative_marking,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn config_test() {
        let config = Config::get_or_init(true).await;
        assert_eq!(config.host().bindto(), "127.0.0.1:5000"); // defaults
        assert_eq!(config.admin().username(), "admin");
    }

    #[test]
    fn grading_section_is_optional() {
        let config = Config::from_slice(
            br#"
            [host]
            bindto = "0.0.0.0:80"

            [app]
            jwt = "secret"
            database_uri = "postgres://localhost/skillnest"

            [admin]
            username = "root"
            password = "root"
            "#,
        )
        .unwrap();

        assert!(config.grading().policy().negative_marking);
        assert!(!config.app().docs());
        assert_eq!(config.app().session_hours(), 24);
    }

    #[test]
    fn negative_marking_can_be_disabled() {
        let config = Config::from_slice(
            br#"
            [host]
            bindto = "0.0.0.0:80"

            [app]
            jwt = "secret"
            database_uri = "postgres://localhost/skillnest"
            docs = true

            [admin]
            username = "root"
            password = "root"

            [grading]
            negative_marking = false
            "#,
        )
        .unwrap();

        assert!(!config.grading().policy().negative_marking);
        assert!(config.app().docs());
    }

    #[test]
    fn unreadable_config_is_not_reported_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let missing = Config::load_from(&path);
        assert!(matches!(missing, Err(ConfigError::ConfigNotFound)));

        std::fs::write(&path, "[host\nbindto = ").unwrap();
        let broken = Config::load_from(&path);
        assert!(matches!(broken, Err(ConfigError::TomlDeError(_))));
    }

    #[test]
    fn missing_section_is_an_error() {
        let result = Config::from_slice(b"[host]\nbindto = \"0.0.0.0:80\"\n");
        assert!(matches!(result, Err(ConfigError::TomlDeError(_))));
    }
}
