use crate::config::config::Config;
use crate::data::row_builder::MissingAttributePolicy;
use crate::export::OutputFormat;
use std::path::{Path, PathBuf};

/// Everything one conversion run needs, resolved from the command line and
/// the config file
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertConfig {
    pub archive_path: PathBuf,
    pub output_path: PathBuf,
    /// Payload names in conversion order
    pub payloads: Vec<String>,
    pub format: OutputFormat,
    pub member_suffix: String,
    pub missing_attribute: MissingAttributePolicy,
    pub pretty: bool,
}

impl ConvertConfig {
    /// Build a run config for `archive_path` using file settings for anything
    /// the caller does not override later
    pub fn from_settings(archive_path: impl Into<PathBuf>, settings: &Config) -> Self {
        let archive_path = archive_path.into();
        let format = settings.output.format;
        let output_path = derive_output_path(
            &archive_path,
            &settings.conversion.source_extension,
            format.extension(),
        );

        Self {
            archive_path,
            output_path,
            payloads: settings.conversion.default_payloads.clone(),
            format,
            member_suffix: settings.conversion.member_suffix.clone(),
            missing_attribute: settings.conversion.missing_attribute,
            pretty: settings.output.pretty,
        }
    }

    /// Archive member holding `payload`
    pub fn member_name(&self, payload: &str) -> String {
        format!("{}{}", payload, self.member_suffix)
    }
}

/// Swap `source_ext` for `output_ext` on the archive path, or append
/// `output_ext` when the archive has some other extension
pub fn derive_output_path(archive: &Path, source_ext: &str, output_ext: &str) -> PathBuf {
    let source_ext = source_ext.trim_start_matches('.');
    let output_ext = output_ext.trim_start_matches('.');

    match archive.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext == source_ext => archive.with_extension(output_ext),
        _ => {
            let mut name = archive.as_os_str().to_owned();
            name.push(".");
            name.push(output_ext);
            PathBuf::from(name)
        }
    }
}
