//! Pipeline configuration module.
//!
//! Handles loading, validating, and merging the `image-steps.toml` file that
//! tells the `run` command which transformation to apply to which files.
//! User config is sparse: it is merged on top of stock defaults, unknown keys
//! are rejected, and every numeric parameter is validated through the same
//! constructors the imaging layer uses.
//!
//! ## Config File Location
//!
//! ```text
//! site-assets/
//! ├── image-steps.toml        # Rules for this tree (never copied to output)
//! ├── photos/
//! │   ├── dawn.jpg
//! │   └── dusk.png
//! └── icons/
//!     └── logo.bmp
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! copy_unmatched = true      # Copy files no rule matches to the output unchanged
//! fail_fast = true           # Stop at the first failed item (false = report and continue)
//!
//! [[rules]]
//! extensions = [".jpg", ".jpeg"]   # Case-sensitive, leading dot
//! directory = "photos"             # Optional: only files under this relative dir
//! step = { operation = "scale-to-fit", width = 1200, height = 1200 }
//!
//! [[rules]]
//! extensions = [".png"]
//! output_extension = ".jpg"        # Optional: re-encode to another format
//! step = { operation = "resize", width = 64, height = 64 }
//! ```
//!
//! Operations: `resize`, `scale-to-fit`, `ensure-fit` (take `width`/`height`)
//! and `compress-jpeg` (takes `quality`, 0-100). The first matching rule wins.

use crate::imaging::format::supported_output_extensions;
use crate::imaging::{OutputFormat, Quality, TargetSize};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the config file looked up in the source directory.
pub const CONFIG_FILENAME: &str = "image-steps.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Pipeline configuration loaded from `image-steps.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Copy files that match no rule through to the output unchanged.
    pub copy_unmatched: bool,
    /// Abort the run at the first failed item instead of reporting and continuing.
    pub fail_fast: bool,
    /// Transformation rules, tried in order.
    pub rules: Vec<Rule>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            copy_unmatched: true,
            fail_fast: true,
            rules: Vec::new(),
        }
    }
}

/// One "files like this get that step" entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rule {
    /// Source extensions this rule applies to, e.g. `[".jpg", ".jpeg"]`.
    pub extensions: Vec<String>,
    /// Restrict the rule to items under this relative directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
    /// Encode to this extension's format instead of the source's.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_extension: Option<String>,
    pub step: StepConfig,
}

/// Raw step parameters as written in TOML.
///
/// Numbers are signed so out-of-range values reach validation instead of
/// failing as a type error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "kebab-case", deny_unknown_fields)]
pub enum StepConfig {
    Resize { width: i64, height: i64 },
    ScaleToFit { width: i64, height: i64 },
    EnsureFit { width: i64, height: i64 },
    CompressJpeg { quality: i64 },
}

impl Rule {
    /// Whether this rule applies to the item `id` (a `/`-separated relative path).
    pub fn matches(&self, id: &str, extension: &str) -> bool {
        if !self.extensions.iter().any(|e| e == extension) {
            return false;
        }
        match &self.directory {
            None => true,
            Some(dir) => {
                let dir = dir.trim_end_matches('/');
                dir.is_empty() || id.strip_prefix(dir).is_some_and(|rest| rest.starts_with('/'))
            }
        }
    }
}

impl PipelineConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (index, rule) in self.rules.iter().enumerate() {
            let invalid =
                |reason: String| ConfigError::Validation(format!("rules[{index}]: {reason}"));

            if rule.extensions.is_empty() {
                return Err(invalid("extensions must not be empty".into()));
            }
            if let Some(ext) = rule.extensions.iter().find(|e| !e.starts_with('.')) {
                return Err(invalid(format!("extension {ext:?} must start with '.'")));
            }

            let output_format = rule
                .output_extension
                .as_deref()
                .map(OutputFormat::from_extension)
                .transpose()
                .map_err(|e| {
                    let supported: Vec<&str> = supported_output_extensions().collect();
                    invalid(format!("{e} (expected one of {})", supported.join(", ")))
                })?;

            match rule.step {
                StepConfig::Resize { width, height }
                | StepConfig::ScaleToFit { width, height }
                | StepConfig::EnsureFit { width, height } => {
                    TargetSize::new(width, height).map_err(|e| invalid(e.to_string()))?;
                }
                StepConfig::CompressJpeg { quality } => {
                    Quality::new(quality).map_err(|e| invalid(e.to_string()))?;
                    if output_format.is_some_and(|f| f != OutputFormat::Jpeg) {
                        return Err(invalid(
                            "compress-jpeg always writes JPEG; output_extension must be .jpg or .jpeg"
                                .into(),
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    /// The first rule matching an item, if any.
    pub fn rule_for(&self, id: &str, extension: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.matches(id, extension))
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(PipelineConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay (including arrays) replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `image-steps.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<PipelineConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PipelineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `image-steps.toml` in the given directory.
pub fn load_config(root: &Path) -> Result<PipelineConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(root)?)
}

/// Returns a fully-commented stock `image-steps.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# image-steps configuration
# ========================
# Place this file as image-steps.toml at the root of the source directory.
# Every key is optional; the values below are the defaults.

# Copy files that no rule matches to the output directory unchanged.
copy_unmatched = true

# Stop at the first item that fails to transform. Set to false to report
# failures per item and keep going.
fail_fast = true

# Rules are tried in order; the first one whose extension (and optional
# directory) matches an item is applied. Extensions are case-sensitive and
# include the leading dot: ".jpg" matches, ".JPG" does not.
#
# Supported output extensions: .jpg .jpeg .png .bmp .tif .tiff
#
# Operations:
#   resize        width, height   exact size, aspect ratio not preserved
#   scale-to-fit  width, height   largest size inside the box (may enlarge)
#   ensure-fit    width, height   like scale-to-fit but never enlarges
#   compress-jpeg quality         re-encode a JPEG at quality 0-100
#
# [[rules]]
# extensions = [".jpg", ".jpeg"]
# directory = "photos"
# step = { operation = "ensure-fit", width = 1600, height = 1600 }
#
# [[rules]]
# extensions = [".jpg"]
# step = { operation = "compress-jpeg", quality = 80 }
#
# [[rules]]
# extensions = [".png"]
# output_extension = ".jpg"
# step = { operation = "resize", width = 64, height = 64 }
"##
}
