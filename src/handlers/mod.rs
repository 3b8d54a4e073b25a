mod auth;
mod city;
mod fallback;
mod health;
mod preferences;
mod walkscore;
mod weather;

pub use auth::{issue_token, me};
pub use city::{CITY_SCORES_NOT_FOUND, city_scores};
pub use fallback::not_found;
pub use health::health_check;
pub use preferences::{delete_preferences, get_preferences, put_preferences};
pub use walkscore::{WALKSCORE_NOT_FOUND, walkscore};
pub use weather::{WEATHER_NOT_FOUND, current_weather};
