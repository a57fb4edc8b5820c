//! # Dest
//!
//! Destination handling for rex.
//!
//! Responsibilities:
//! - Parse destination specifiers (`type=file,id=out.log,create`)
//! - Load TOML/JSON config files
//! - Validate destinations and configs
//! - Open destinations as sinks
//!
//! # Example
//!
//! ```no_run
//! let spec = dest::parse("type=file,id=/tmp/out.log,create,append").unwrap();
//! let sink = dest::open(&spec).unwrap();
//! ```

mod open;
mod parser;
mod specifier;
mod validator;

pub use contracts::{DestSpec, DestType, RexConfig};
pub use open::{open, open_all};
pub use parser::ConfigFormat;
pub use validator::{validate, validate_config};

use contracts::ContractError;
use std::path::Path;

/// Parse and validate a destination specifier
///
/// # Errors
/// Grammar errors ([`ContractError::DestParse`]) or rule violations
/// ([`ContractError::DestValidation`]).
pub fn parse(s: &str) -> Result<DestSpec, ContractError> {
    let spec = specifier::parse(s)?;
    validator::validate(&spec)?;
    Ok(spec)
}

/// Parse every specifier, stopping at the first invalid one
pub fn parse_all<I, S>(specs: I) -> Result<Vec<DestSpec>, ContractError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    specs.into_iter().map(|s| parse(s.as_ref())).collect()
}

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<RexConfig, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<RexConfig, ContractError> {
        let config = parser::parse(content, format)?;
        validator::validate_config(&config)?;
        Ok(config)
    }

    /// Serialize a config to TOML
    pub fn to_toml(config: &RexConfig) -> Result<String, ContractError> {
        toml::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const SAMPLE_TOML: &str = r#"
buffer_size = 4096

[[destinations]]
type = "fd"
id = "1"

[[destinations]]
type = "fifo"
id = "/tmp/rex.fifo"
create = true
nonblocking = true
bufsize = 16384
"#;

    #[test]
    fn test_parse_validates() {
        assert!(parse("type=fd,id=2").is_ok());

        let err = parse("type=fd,id=stderr").unwrap_err();
        assert!(matches!(err, ContractError::DestValidation { .. }));

        let err = parse("type=fd").unwrap_err();
        assert!(matches!(err, ContractError::DestParse { .. }));
    }

    #[test]
    fn test_parse_all_keeps_order() {
        let specs = parse_all(["type=fd,id=1", "type=fd,id=2"]).unwrap();
        assert_eq!(specs[0].id, "1");
        assert_eq!(specs[1].id, "2");

        assert!(parse_all(["type=fd,id=1", "bogus"]).is_err());
    }

    #[test]
    fn test_load_from_str_toml() {
        let config = ConfigLoader::load_from_str(SAMPLE_TOML, ConfigFormat::Toml).unwrap();
        assert_eq!(config.buffer_size, 4096);
        assert_eq!(config.destinations.len(), 2);
        assert_eq!(config.destinations[1].bufsize, 16384);
    }

    #[test]
    fn test_config_matches_specifier() {
        let config = ConfigLoader::load_from_str(SAMPLE_TOML, ConfigFormat::Toml).unwrap();
        let from_cli =
            parse("type=fifo,id=/tmp/rex.fifo,create,nonblocking,bufsize=16384").unwrap();
        assert_eq!(config.destinations[1], from_cli);
    }

    #[test]
    fn test_round_trip_toml() {
        let config = ConfigLoader::load_from_str(SAMPLE_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&config).unwrap();
        let again = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(config, again);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = r#"
[[destinations]]
type = "proc"
id = "cat"
nonblocking = true
"#;
        let err = ConfigLoader::load_from_str(content, ConfigFormat::Toml).unwrap_err();
        assert!(err.to_string().contains("destinations[0]"), "got: {err}");
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempdir().unwrap();

        let path = dir.path().join("rex.toml");
        fs::write(&path, SAMPLE_TOML).unwrap();
        assert!(ConfigLoader::load_from_path(&path).is_ok());

        let path = dir.path().join("rex.yaml");
        fs::write(&path, SAMPLE_TOML).unwrap();
        let err = ConfigLoader::load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));

        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            ConfigLoader::load_from_path(&missing),
            Err(ContractError::Io(_))
        ));
    }
}
