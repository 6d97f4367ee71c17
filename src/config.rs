use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::ConfigError;

/// Mapping from page format name to physical dimensions in inches.
///
/// Carries a built-in table of common paper sizes; an optional JSON config
/// file can replace or extend individual entries.
#[derive(Debug, Clone)]
pub struct PageSizeTable {
    sizes: BTreeMap<String, (f64, f64)>,
}

/// Optional JSON config file format
#[derive(Debug, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub page_sizes: BTreeMap<String, (f64, f64)>,
}

impl Default for PageSizeTable {
    fn default() -> Self {
        let sizes = [
            ("a3", (11.69, 16.54)),
            ("a4", (8.27, 11.69)),
            ("a5", (5.83, 8.27)),
            ("letter", (8.5, 11.0)),
            ("legal", (8.5, 14.0)),
            ("tabloid", (11.0, 17.0)),
        ]
        .into_iter()
        .map(|(name, dims)| (name.to_string(), dims))
        .collect();

        Self { sizes }
    }
}

impl PageSizeTable {
    /// Load the built-in table, merged with overrides from a JSON config file
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut table = Self::default();

        if let Some(path) = config_path {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: ConfigFile = serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

            for (name, dims) in config.page_sizes {
                table.sizes.insert(name.to_lowercase(), dims);
            }
        }

        Ok(table)
    }

    /// Resolve a page format to pixel dimensions at the given DPI.
    ///
    /// Dimensions are truncated toward zero, matching integer pixel output.
    pub fn page_size_pixels(&self, format_name: &str, dpi: u32) -> Result<(u32, u32), ConfigError> {
        match self.sizes.get(&format_name.to_lowercase()) {
            Some(&(width_in, height_in)) => Ok((
                (width_in * dpi as f64) as u32,
                (height_in * dpi as f64) as u32,
            )),
            None => Err(ConfigError::UnsupportedPageFormat {
                format: format_name.to_string(),
                supported: self.format_names().join(", "),
            }),
        }
    }

    /// Known format names, for error messages
    pub fn format_names(&self) -> Vec<&str> {
        self.sizes.keys().map(|s| s.as_str()).collect()
    }
}
