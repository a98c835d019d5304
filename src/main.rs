use crossterm::style::Stylize;
use mwx_convert::config::config::Config;
use mwx_convert::config::{derive_output_path, ConvertConfig};
use mwx_convert::converter::{convert, ConversionReport};
use mwx_convert::data::row_builder::MissingAttributePolicy;
use mwx_convert::export::OutputFormat;
use mwx_convert::utils::logging::init_tracing;
use std::path::PathBuf;
use std::process::ExitCode;

fn print_help() {
    println!("{}", "mwx-convert - radiosonde MWX archive converter".blue().bold());
    println!();
    println!("{}", "Usage:".yellow());
    println!("  mwx-convert [OPTIONS] <ARCHIVE.mwx> [PAYLOAD...]");
    println!();
    println!("{}", "Options:".yellow());
    println!("  {} <path>      - Output path (default: archive with new extension)", "-o".green());
    println!("  {} <json|csv> - Output format", "--format".green());
    println!("  {} <file>    - Read settings from this file", "--config".green());
    println!(
        "  {} <carry-forward|reset> - Value for attributes a record omits",
        "--missing".green()
    );
    println!("  {}          - Indent JSON output", "--pretty".green());
    println!("  {} - Write a commented config file and exit", "--generate-config".green());
    println!("  {}            - Show this help", "--help".green());
    println!();
    println!("{}", "Payloads:".yellow());
    println!("  Each payload names an archive member <PAYLOAD>.xml. GpsResults is");
    println!("  converted when none are given.");
    println!();
}

/// Command line as typed, before settings are applied
#[derive(Debug, Default)]
struct CliArgs {
    archive: Option<PathBuf>,
    payloads: Vec<String>,
    output: Option<PathBuf>,
    format: Option<OutputFormat>,
    config: Option<PathBuf>,
    missing: Option<MissingAttributePolicy>,
    pretty: bool,
    help: bool,
    generate_config: bool,
}

fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    let mut cli = CliArgs::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| {
            iter.next()
                .cloned()
                .ok_or_else(|| format!("{} needs a value", flag))
        };

        match arg.as_str() {
            "-h" | "--help" => cli.help = true,
            "--generate-config" => cli.generate_config = true,
            "--pretty" => cli.pretty = true,
            "-o" | "--output" => cli.output = Some(PathBuf::from(value(arg.as_str())?)),
            "--config" => cli.config = Some(PathBuf::from(value(arg.as_str())?)),
            "--format" => cli.format = Some(value(arg.as_str())?.parse()?),
            "--missing" => cli.missing = Some(value(arg.as_str())?.parse()?),
            flag if flag.starts_with('-') && flag.len() > 1 => {
                return Err(format!("unknown option {}", flag));
            }
            positional => {
                if cli.archive.is_none() {
                    cli.archive = Some(PathBuf::from(positional));
                } else {
                    cli.payloads.push(positional.to_string());
                }
            }
        }
    }

    Ok(cli)
}

fn generate_config() -> ExitCode {
    let path = match Config::get_config_path() {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Error determining config path: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            eprintln!("Error creating config directory: {}", e);
            return ExitCode::FAILURE;
        }
    }
    if let Err(e) = std::fs::write(&path, Config::create_default_with_comments()) {
        eprintln!("Error writing config file: {}", e);
        return ExitCode::FAILURE;
    }
    println!("Configuration file created at: {:?}", path);
    ExitCode::SUCCESS
}

fn build_convert_config(cli: CliArgs, archive: PathBuf, settings: &Config) -> ConvertConfig {
    let mut config = ConvertConfig::from_settings(archive, settings);

    if let Some(format) = cli.format {
        config.format = format;
        config.output_path = derive_output_path(
            &config.archive_path,
            &settings.conversion.source_extension,
            format.extension(),
        );
    }
    if let Some(output) = cli.output {
        config.output_path = output;
    }
    if let Some(missing) = cli.missing {
        config.missing_attribute = missing;
    }
    if !cli.payloads.is_empty() {
        config.payloads = cli.payloads;
    }
    config.pretty |= cli.pretty;
    config
}

fn print_report(report: &ConversionReport) {
    for table in &report.converted {
        println!(
            "{} {} -> {} ({} rows, {} columns)",
            "ok".green(),
            table.payload,
            table.table_name,
            table.rows(),
            table.columns.len()
        );
    }
    for skipped in &report.skipped {
        println!("{} {}: {}", "skipped".yellow(), skipped.payload, skipped.error);
    }
    println!(
        "Wrote {} table(s), {} rows to {}",
        report.converted.len(),
        report.total_rows(),
        report.output_path.display()
    );
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("{}", format!("Error: {}", e).red());
            print_help();
            return ExitCode::FAILURE;
        }
    };

    if cli.help {
        print_help();
        return ExitCode::SUCCESS;
    }
    if cli.generate_config {
        return generate_config();
    }

    let Some(archive) = cli.archive.clone() else {
        eprintln!("{}", "Error: no archive given".red());
        print_help();
        return ExitCode::FAILURE;
    };

    let settings = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let settings = match settings {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}", format!("Error: {:#}", e).red());
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_tracing(&settings.logging.level, settings.logging.log_file.as_deref()) {
        eprintln!("Warning: {:#}", e);
    }

    let config = build_convert_config(cli, archive, &settings);
    match convert(&config) {
        Ok(report) => {
            print_report(&report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(target: "main", "conversion failed: {:#}", e);
            eprintln!("{}", format!("Error: {:#}", e).red());
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_positionals_split_into_archive_and_payloads() {
        let cli = parse_args(&args(&["flight.mwx", "GpsResults", "PtuResults"])).unwrap();
        assert_eq!(cli.archive, Some(PathBuf::from("flight.mwx")));
        assert_eq!(cli.payloads, vec!["GpsResults", "PtuResults"]);
    }

    #[test]
    fn test_flags_override_settings() {
        let cli = parse_args(&args(&[
            "--format", "csv", "--missing", "reset", "--pretty", "flight.mwx",
        ]))
        .unwrap();
        let archive = cli.archive.clone().unwrap();
        let config = build_convert_config(cli, archive, &Config::default());

        assert_eq!(config.format, OutputFormat::Csv);
        assert_eq!(config.output_path, PathBuf::from("flight.tables"));
        assert_eq!(config.missing_attribute, MissingAttributePolicy::Reset);
        assert_eq!(config.payloads, vec!["GpsResults"]);
        assert!(config.pretty);
    }

    #[test]
    fn test_explicit_output_wins() {
        let cli = parse_args(&args(&["flight.mwx", "-o", "out/x.json"])).unwrap();
        let archive = cli.archive.clone().unwrap();
        let config = build_convert_config(cli, archive, &Config::default());
        assert_eq!(config.output_path, PathBuf::from("out/x.json"));
    }

    #[test]
    fn test_bad_flags_are_rejected() {
        assert!(parse_args(&args(&["--format"])).is_err());
        assert!(parse_args(&args(&["--format", "root"])).is_err());
        assert!(parse_args(&args(&["--bogus", "flight.mwx"])).is_err());
    }
}
