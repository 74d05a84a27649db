//! Configuration files whose format follows the file extension

use std::fmt;

use serde::{Serialize, de::DeserializeOwned};

use crate::{Error, NormalizedPath, Result, io};

/// Serialization format of a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Json,
}

impl Format {
    /// Pick the format for `path` from its extension, case-insensitively.
    pub fn for_path(path: &NormalizedPath) -> Result<Self> {
        let extension = path.extension().unwrap_or("");
        match extension.to_ascii_lowercase().as_str() {
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            _ => Err(Error::UnsupportedFormat {
                extension: extension.to_string(),
            }),
        }
    }

    fn decode<T: DeserializeOwned>(self, content: &str) -> std::result::Result<T, String> {
        match self {
            Self::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            Self::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        }
    }

    fn encode<T: Serialize>(self, value: &T) -> std::result::Result<String, String> {
        match self {
            Self::Toml => toml::to_string_pretty(value).map_err(|e| e.to_string()),
            Self::Json => serde_json::to_string_pretty(value).map_err(|e| e.to_string()),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Toml => "TOML",
            Self::Json => "JSON",
        })
    }
}

/// Loads and saves serde types as TOML or JSON files.
///
/// Writes go through [`io::write_atomic`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigStore;

impl ConfigStore {
    pub fn new() -> Self {
        Self
    }

    pub fn load<T: DeserializeOwned>(&self, path: &NormalizedPath) -> Result<T> {
        let format = Format::for_path(path)?;
        let content = io::read_text(path)?;
        Self::decode(format, path, &content)
    }

    /// Like [`load`](Self::load), but a missing file is `Ok(None)`.
    pub fn load_optional<T: DeserializeOwned>(&self, path: &NormalizedPath) -> Result<Option<T>> {
        let format = Format::for_path(path)?;
        match io::read_text(path) {
            Ok(content) => Self::decode(format, path, &content).map(Some),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub fn save<T: Serialize>(&self, path: &NormalizedPath, value: &T) -> Result<()> {
        let format = Format::for_path(path)?;
        let content = format.encode(value).map_err(|message| Error::ConfigSerialize {
            path: path.to_native(),
            format: format.to_string(),
            message,
        })?;
        io::write_atomic(path, content.as_bytes())
    }

    fn decode<T: DeserializeOwned>(format: Format, path: &NormalizedPath, content: &str) -> Result<T> {
        format.decode(content).map_err(|message| Error::ConfigParse {
            path: path.to_native(),
            format: format.to_string(),
            message,
        })
    }
}
