use crate::data::row_builder::MissingAttributePolicy;
use crate::export::OutputFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub conversion: ConversionConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Payloads converted when none are named on the command line
    pub default_payloads: Vec<String>,

    /// Archive extension replaced when deriving the output path
    pub source_extension: String,

    /// Appended to a payload name to find its archive member
    pub member_suffix: String,

    /// What a record that omits an attribute stores for it
    pub missing_attribute: MissingAttributePolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,

    /// Indent the JSON container
    pub pretty: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, overridden by RUST_LOG
    pub level: String,

    /// Also write logs to this file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            default_payloads: vec!["GpsResults".to_string()],
            source_extension: "mwx".to_string(),
            member_suffix: ".xml".to_string(),
            missing_attribute: MissingAttributePolicy::CarryForward,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_file: None,
        }
    }
}

impl Config {
    /// Load config from the default location, falling back to defaults when
    /// no file exists
    pub fn load() -> Result<Self> {
        match Self::get_config_path() {
            Ok(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load config from an explicit path; the file must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }

    /// Get the default config file path
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("mwx-convert").join("config.toml"))
    }

    /// Create a default config file with comments
    pub fn create_default_with_comments() -> String {
        r#"# mwx-convert configuration
# Location: ~/.config/mwx-convert/config.toml (Linux)
#           ~/Library/Application Support/mwx-convert/config.toml (macOS)
#           %APPDATA%\mwx-convert\config.toml (Windows)

[conversion]
# Payloads converted when none are given on the command line
default_payloads = ["GpsResults"]

# Extension swapped for the output extension when -o is not given
source_extension = "mwx"

# Appended to each payload name to find the archive member
member_suffix = ".xml"

# Value stored when a record omits an attribute the first record had:
#   "carry_forward" repeats the previous record's value
#   "reset" stores NaN (numbers and times) or "" (text)
missing_attribute = "carry_forward"

[output]
# "json": one JSON document holding every table
# "csv":  a directory with one CSV file per table plus schema.json
format = "json"

# Indent the JSON document
pretty = false

[logging]
# tracing filter directive; RUST_LOG takes precedence
level = "info"

# Also write logs to a file
# log_file = "/tmp/mwx-convert.log"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.conversion.default_payloads, vec!["GpsResults"]);
        assert_eq!(config.conversion.member_suffix, ".xml");
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_commented_default_matches_default() {
        let parsed: Config = toml::from_str(&Config::create_default_with_comments()).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[output]\nformat = \"csv\"\n\n[conversion]\nmissing_attribute = \"reset\""
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.output.format, OutputFormat::Csv);
        assert_eq!(
            config.conversion.missing_attribute,
            MissingAttributePolicy::Reset
        );
        assert_eq!(config.conversion.default_payloads, vec!["GpsResults"]);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        assert!(Config::load_from(Path::new("/nonexistent/mwx-convert.toml")).is_err());
    }
}
