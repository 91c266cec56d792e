//! Environment variable source: CODEPACK__ prefix with __ separator

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

/// Prefix for configuration overrides, e.g. `CODEPACK__TREE__MAX_DEPTH=8`.
pub const ENV_PREFIX: &str = "CODEPACK";

/// Add environment variable overlay to builder.
///
/// The prefix separator is also `__`, so single-underscore `CODEPACK_LOG*`
/// logging variables are not picked up here.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(environment()))
}

pub(crate) fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
