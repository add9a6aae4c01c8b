//! Command line argument parsing and validation.

use clap::Parser;
use std::path::PathBuf;

/// Native installer bundler driven by packaging parameters
#[derive(Parser, Debug)]
#[command(
    name = "kodegen_bundler_package",
    version,
    about = "Packages an application image into native installers (.rpm, .deb, .dmg, .exe)",
    long_about = "Packages an application image into native installers (.rpm, .deb, .dmg, .exe).

Parameters come from an optional TOML file ([params] table) and --set overrides.
Every requested format is validated before any of them is built; one failing
format never stops the others.

Usage:
  kodegen_bundler_package --config package.toml --output-dir dist
  kodegen_bundler_package -f rpm -f deb --set appName=Hello --set mainBinary=target/release/hello -o dist
  kodegen_bundler_package --list

Exit code 0 = every requested format produced an artifact."
)]
pub struct Args {
    /// Format to build: rpm, deb, dmg, exe or all (repeatable, default all for this host)
    #[arg(short, long = "format", value_name = "FORMAT")]
    pub formats: Vec<String>,

    /// TOML file with a [params] table
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory receiving the artifacts
    #[arg(
        short,
        long,
        value_name = "DIR",
        required_unless_present = "list"
    )]
    pub output_dir: Option<PathBuf>,

    /// Root for per-format working directories
    #[arg(long, value_name = "DIR")]
    pub build_root: Option<PathBuf>,

    /// Sets a parameter from raw text, e.g. --set appVersion=2.1
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub set: Vec<(String, String)>,

    /// Sets a parameter to an explicit null, suppressing its default
    #[arg(long = "unset", value_name = "KEY")]
    pub unset: Vec<String>,

    /// Log native tool output and save rendered config files
    #[arg(short, long, env = "KODEGEN_BUNDLER_VERBOSE")]
    pub verbose: bool,

    /// Keep working directories for inspection
    #[arg(long)]
    pub retain_working_dir: bool,

    /// Print the bundlers and their parameters as JSON and exit
    #[arg(long)]
    pub list: bool,

    /// Print the batch report as JSON
    #[arg(long)]
    pub json: bool,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing parameter name in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Keys named by both `--set` and `--unset`.
    pub fn conflicting_keys(&self) -> Vec<String> {
        let mut conflicts: Vec<String> = self
            .set
            .iter()
            .filter(|(key, _)| self.unset.contains(key))
            .map(|(key, _)| key.clone())
            .collect();
        conflicts.dedup();
        conflicts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_values_split_on_first_equals() {
        assert_eq!(
            parse_key_value("description=a=b").unwrap(),
            ("description".to_string(), "a=b".to_string())
        );
        assert!(parse_key_value("appName").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn formats_repeat_and_output_dir_is_required() {
        let args = Args::try_parse_from(["bundle", "-f", "rpm", "-f", "deb", "-o", "dist"]).unwrap();
        assert_eq!(args.formats, vec!["rpm", "deb"]);
        assert!(Args::try_parse_from(["bundle", "-f", "rpm"]).is_err());
        assert!(Args::try_parse_from(["bundle", "--list"]).is_ok());
    }

    #[test]
    fn set_and_unset_of_one_key_conflict() {
        let args = Args::try_parse_from([
            "bundle",
            "-o",
            "dist",
            "--set",
            "runtime=/jre",
            "--unset",
            "runtime",
        ])
        .unwrap();
        assert_eq!(args.conflicting_keys(), vec!["runtime"]);
    }
}
