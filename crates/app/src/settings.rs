//! Handles settings for the application. Configuration is written in
//! `settings.toml`; every key without a default is startup-fatal when
//! missing.

use config::{Config, ConfigError, File};
use relay_bot::UnlinkedPolicy;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    #[default]
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Bot {
    pub token: String,
    /// Base URL of the platform HTTP API.
    pub server: String,
    pub guild_id: i64,
    pub open_grouping: i64,
    pub closed_grouping: i64,
    pub operator_role: String,
    pub feed_url: String,
    #[serde(default)]
    pub unlinked_policy: UnlinkedPolicy,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    /// Omitting the section runs on an in-memory database.
    #[serde(default)]
    pub database: Database,
    pub bot: Bot,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings"))
            .build()?;

        settings.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    const MINIMAL: &str = r#"
        [app]
        level = "info"

        [bot]
        token = "t"
        server = "http://localhost"
        guild_id = 1
        open_grouping = 10
        closed_grouping = 20
        operator_role = "Operator"
        feed_url = "http://localhost/feed.csv"
    "#;

    fn parse(raw: &str) -> Result<Settings, ConfigError> {
        Config::builder()
            .add_source(File::from_str(raw, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    #[test]
    fn missing_database_section_defaults_to_memory() {
        let settings = parse(MINIMAL).unwrap();
        assert!(matches!(settings.database, Database::Memory));
    }

    #[test]
    fn sqlite_path_is_read_when_given() {
        let raw = format!("{MINIMAL}\n[database]\nsqlite = \"./sportello.db\"\n");
        let settings = parse(&raw).unwrap();
        assert!(matches!(settings.database, Database::Sqlite(path) if path == "./sportello.db"));
    }
}
