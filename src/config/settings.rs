use serde::Deserialize;

use crate::codec::DEFAULT_ROOT;

/// Top-level configuration settings for the application.
#[derive(Debug, Default, Deserialize, Clone, PartialEq, Eq)]
pub struct Settings {
    pub log: LogSettings,
    pub broker: BrokerSettings,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: String,
}

/// Configuration settings for the broker.
///
/// `root_element` names the document element of the wire form.
/// `isolate_panics` decides whether a panicking subscriber is caught and
/// logged or allowed to unwind into the publisher.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct BrokerSettings {
    pub root_element: String,
    pub isolate_panics: bool,
}

/// Partial configuration settings loaded from files or environment.
///
/// Missing values are filled from `Settings::default()`.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub log: Option<PartialLogSettings>,
    pub broker: Option<PartialBrokerSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialLogSettings {
    pub level: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PartialBrokerSettings {
    pub root_element: Option<String>,
    pub isolate_panics: Option<bool>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            root_element: DEFAULT_ROOT.to_string(),
            isolate_panics: true,
        }
    }
}
