mod settings;

use std::path::Path;

use config::{Config, ConfigError, Environment, File};

use settings::PartialSettings;

pub use settings::{BrokerSettings, LogSettings, Settings};

/// Prefix of environment overrides, e.g. `ACKSUB__BROKER__ROOT_ELEMENT`.
pub const ENV_PREFIX: &str = "ACKSUB";

/// Loads the configuration from `config/default` (any format the `config`
/// crate recognises, optional) and `ACKSUB__*` environment variables, then
/// fills whatever is missing from defaults.
pub fn load_config() -> Result<Settings, ConfigError> {
    load_config_from(Path::new("config/default"))
}

/// Same as [`load_config`] with an explicit file stem instead of
/// `config/default`.
pub fn load_config_from(file: &Path) -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name(&file.to_string_lossy()).required(false))
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let config = builder.build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    // Merge with defaults
    let default = Settings::default();

    Ok(Settings {
        log: LogSettings {
            level: partial
                .log
                .as_ref()
                .and_then(|l| l.level.clone())
                .unwrap_or(default.log.level),
        },
        broker: BrokerSettings {
            root_element: partial
                .broker
                .as_ref()
                .and_then(|b| b.root_element.clone())
                .unwrap_or(default.broker.root_element),
            isolate_panics: partial
                .broker
                .as_ref()
                .and_then(|b| b.isolate_panics)
                .unwrap_or(default.broker.isolate_panics),
        },
    })
}

#[cfg(test)]
mod tests;
