mod preferences;
mod tokens;

pub use preferences::PreferenceService;
pub use tokens::TokenService;
