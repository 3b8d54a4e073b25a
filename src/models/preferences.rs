use serde::{Deserialize, Serialize};

/// Unit system used when requesting weather data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
    Standard,
}

impl Units {
    /// Value understood by the weather provider's `units` parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Imperial => "imperial",
            Self::Standard => "standard",
        }
    }
}

/// Stored preferences for one user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Preferences {
    /// City shown by default in the client
    #[serde(default)]
    pub home_city: Option<String>,
    #[serde(default)]
    pub units: Units,
    #[serde(default)]
    pub favorite_cities: Vec<String>,
}
