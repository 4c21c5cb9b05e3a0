//! Store connection settings.
//!
//! # Responsibility
//! - Describe where the document store lives and which collection holds
//!   each entity kind.
//! - Load settings from an `appsettings.json`-style file.
//!
//! # Invariants
//! - Collection names are distinct, non-empty identifiers.
//! - `connection_string` is either `:memory:` or a directory path.

use crate::model::document::EntityKind;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Connection string selecting a private in-memory store.
pub const IN_MEMORY: &str = ":memory:";

const SETTINGS_SECTION: &str = "DatabaseSettings";

static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]{0,63}$").expect("valid name regex"));

/// Errors raised while loading or validating settings.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
    MissingSection(&'static str),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read settings `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid settings json: {err}"),
            Self::MissingSection(name) => write!(f, "settings section `{name}` is missing"),
            Self::Invalid(message) => write!(f, "invalid settings: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::MissingSection(_) | Self::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Connection string, database name and one collection per entity kind.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DatabaseSettings {
    pub connection_string: String,
    pub database_name: String,
    pub volunteers_collection_name: String,
    pub users_collection_name: String,
    pub organisations_collection_name: String,
    pub opportunities_collection_name: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            connection_string: IN_MEMORY.to_string(),
            database_name: "TimeSharer".to_string(),
            volunteers_collection_name: "Volunteers".to_string(),
            users_collection_name: "Users".to_string(),
            organisations_collection_name: "Organisations".to_string(),
            opportunities_collection_name: "Opportunities".to_string(),
        }
    }
}

impl DatabaseSettings {
    /// Settings for a private in-memory store with default collection names.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Settings for an on-disk store located in `dir`.
    pub fn in_directory(dir: impl AsRef<Path>) -> Self {
        Self {
            connection_string: dir.as_ref().display().to_string(),
            ..Self::default()
        }
    }

    /// Reads the `DatabaseSettings` section from a JSON settings file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Parses the `DatabaseSettings` section from JSON text and validates it.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let mut root: serde_json::Value = serde_json::from_str(text)?;
        let section = root
            .get_mut(SETTINGS_SECTION)
            .map(serde_json::Value::take)
            .ok_or(ConfigError::MissingSection(SETTINGS_SECTION))?;
        let settings: Self = serde_json::from_value(section)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks names and connection string.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connection_string.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "ConnectionString cannot be empty".to_string(),
            ));
        }
        check_name("DatabaseName", &self.database_name)?;

        let collections = [
            ("VolunteersCollectionName", &self.volunteers_collection_name),
            ("UsersCollectionName", &self.users_collection_name),
            ("OrganisationsCollectionName", &self.organisations_collection_name),
            ("OpportunitiesCollectionName", &self.opportunities_collection_name),
        ];
        for (key, value) in collections {
            check_name(key, value)?;
        }
        for (index, (key, value)) in collections.iter().enumerate() {
            if let Some((other, _)) = collections[index + 1..]
                .iter()
                .find(|(_, candidate)| candidate.eq_ignore_ascii_case(value))
            {
                return Err(ConfigError::Invalid(format!(
                    "{key} and {other} both name collection `{value}`"
                )));
            }
        }
        Ok(())
    }

    /// Collection name configured for `kind`.
    pub fn collection_for(&self, kind: EntityKind) -> &str {
        match kind {
            EntityKind::Volunteer => &self.volunteers_collection_name,
            EntityKind::Organisation => &self.organisations_collection_name,
            EntityKind::Opportunity => &self.opportunities_collection_name,
            EntityKind::User => &self.users_collection_name,
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.connection_string.trim() == IN_MEMORY
    }

    /// Database file path for on-disk stores.
    pub fn database_path(&self) -> Option<PathBuf> {
        if self.is_in_memory() {
            return None;
        }
        Some(
            Path::new(self.connection_string.trim())
                .join(format!("{}.sqlite3", self.database_name)),
        )
    }
}

fn check_name(key: &str, value: &str) -> Result<(), ConfigError> {
    if NAME_RE.is_match(value) {
        return Ok(());
    }
    Err(ConfigError::Invalid(format!(
        "{key} `{value}` must start with a letter and contain only letters, digits or `_`"
    )))
}
