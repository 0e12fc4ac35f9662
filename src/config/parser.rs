use crate::config::types::CheckOptions;
use crate::ConfigError;
use std::path::Path;

/// Loads check options from a TOML configuration file
///
/// The file is parsed but not validated: paths usually arrive from the
/// command line afterwards, so validation runs when the check starts.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(CheckOptions)` - Successfully loaded options
/// * `Err(ConfigError)` - Failed to read or parse the file
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use ripple_check::config::load_config;
///
/// let options = load_config(Path::new("ripple-check.toml")).unwrap();
/// println!("Recurse: {}", options.recurse);
/// ```
pub fn load_config(path: &Path) -> Result<CheckOptions, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses check options from TOML text
pub fn parse_config(content: &str) -> Result<CheckOptions, ConfigError> {
    let options: CheckOptions = toml::from_str(content)?;
    Ok(options)
}
