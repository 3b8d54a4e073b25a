mod api;
mod preferences;

pub use api::{
    HealthResponse, MeResponse, TokenRequest, TokenResponse, WalkScoreParams, WeatherParams,
};
pub use preferences::{Preferences, Units};
