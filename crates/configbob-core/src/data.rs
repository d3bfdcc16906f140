//! Template input data loaded from JSON and YAML files

use serde_json::{Map, Value as JsonValue};
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};

/// Merged input data passed to every template render of a build
///
/// Later files replace earlier files' keys at the top level only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataSet(pub Map<String, JsonValue>);

/// Supported data file encodings, picked by file suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Json,
    Yaml,
}

impl DataFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.to_string_lossy();
        if name.ends_with(".json") {
            Some(Self::Json)
        } else if name.ends_with(".yml") || name.ends_with(".yaml") {
            Some(Self::Yaml)
        } else {
            None
        }
    }
}

impl DataSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and merge data files left to right
    pub fn load<P: AsRef<Path>>(files: &[P]) -> Result<Self> {
        let mut data = Self::new();
        for file in files {
            let file_data = Self::from_file(file.as_ref())?;
            data.merge(file_data);
        }
        Ok(data)
    }

    /// Load a single data file
    pub fn from_file(path: &Path) -> Result<Self> {
        let format = DataFormat::from_path(path).ok_or_else(|| CoreError::UnsupportedDataFormat {
            path: path.to_path_buf(),
        })?;

        let content = std::fs::read_to_string(path).map_err(|source| CoreError::DataFileRead {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&content, format, path)
    }

    /// Parse data from a string in the given format
    ///
    /// `origin` is only used for error messages.
    pub fn parse(content: &str, format: DataFormat, origin: &Path) -> Result<Self> {
        let parse_error = |message: String| CoreError::DataFileParse {
            path: origin.to_path_buf(),
            message,
        };

        let value: JsonValue = match format {
            DataFormat::Json => serde_json::from_str(content).map_err(|e| parse_error(e.to_string()))?,
            DataFormat::Yaml => serde_yaml::from_str(content).map_err(|e| parse_error(e.to_string()))?,
        };

        match value {
            JsonValue::Object(map) => Ok(Self(map)),
            // An empty YAML document
            JsonValue::Null => Ok(Self::new()),
            _ => Err(CoreError::DataFileNotMapping {
                path: origin.to_path_buf(),
            }),
        }
    }

    /// Overlay another data set, replacing top-level keys
    pub fn merge(&mut self, overlay: DataSet) {
        for (key, value) in overlay.0 {
            self.0.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.0.get(key)
    }

    /// Top-level keys, used for "did you mean" suggestions
    pub fn keys(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Render a list of paths for log and console output
pub fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
