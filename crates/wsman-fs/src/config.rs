//! Loading and saving of workspace files
//!
//! Workspace files are YAML. Override tables written by `wsman snapshot` may
//! also be TOML or JSON, picked from the file extension.

use crate::{Error, NormalizedPath, Result, io};
use serde::{Serialize, de::DeserializeOwned};

/// Serialization format of a file, from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
    Json,
}

impl ConfigFormat {
    /// Format of `path`, or [`Error::UnsupportedFormat`].
    pub fn of(path: &NormalizedPath) -> Result<Self> {
        let extension = path.extension().unwrap_or("").to_ascii_lowercase();
        match extension.as_str() {
            "yml" | "yaml" => Ok(Self::Yaml),
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            _ => Err(Error::UnsupportedFormat { extension }),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Yaml => "YAML",
            Self::Toml => "TOML",
            Self::Json => "JSON",
        }
    }

    fn decode<T: DeserializeOwned>(self, content: &str) -> std::result::Result<T, String> {
        match self {
            Self::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
            Self::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            Self::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        }
    }

    fn encode<T: Serialize>(self, value: &T) -> std::result::Result<String, String> {
        match self {
            Self::Yaml => serde_yaml::to_string(value).map_err(|e| e.to_string()),
            Self::Toml => toml::to_string_pretty(value).map_err(|e| e.to_string()),
            Self::Json => serde_json::to_string_pretty(value)
                .map(|json| json + "\n")
                .map_err(|e| e.to_string()),
        }
    }
}

/// Reads and writes serde types to files in the format their extension names.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigStore;

impl ConfigStore {
    pub fn new() -> Self {
        Self
    }

    /// Load and decode `path`.
    pub fn load<T: DeserializeOwned>(&self, path: &NormalizedPath) -> Result<T> {
        let content = io::read_text(path)?;
        self.parse(path, &content)
    }

    /// Like [`ConfigStore::load`], but a missing file is `None`.
    pub fn load_optional<T: DeserializeOwned>(&self, path: &NormalizedPath) -> Result<Option<T>> {
        if !path.is_file() {
            return Ok(None);
        }
        self.load(path).map(Some)
    }

    /// Decode `content` as if it had been read from `path`.
    pub fn parse<T: DeserializeOwned>(&self, path: &NormalizedPath, content: &str) -> Result<T> {
        let format = ConfigFormat::of(path)?;
        format.decode(content).map_err(|message| Error::ConfigParse {
            path: path.to_native(),
            format: format.name().to_string(),
            message,
        })
    }

    /// Encode `value` and write it atomically to `path`.
    pub fn save<T: Serialize>(&self, path: &NormalizedPath, value: &T) -> Result<()> {
        let format = ConfigFormat::of(path)?;
        let content = format.encode(value).map_err(|message| Error::ConfigSerialize {
            path: path.to_native(),
            format: format.name().to_string(),
            message,
        })?;
        io::write_text(path, &content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_follows_the_extension() {
        let format = |p: &str| ConfigFormat::of(&NormalizedPath::new(p));
        assert_eq!(format("/ws/.wsman/workspace.yml").unwrap(), ConfigFormat::Yaml);
        assert_eq!(format("pins.YAML").unwrap(), ConfigFormat::Yaml);
        assert_eq!(format("pins.toml").unwrap(), ConfigFormat::Toml);
        assert_eq!(format("pins.json").unwrap(), ConfigFormat::Json);
        assert!(matches!(
            format("source"),
            Err(Error::UnsupportedFormat { extension }) if extension.is_empty()
        ));
    }
}
