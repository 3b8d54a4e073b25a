//! Input validation and normalization for path, query and body values.

use crate::error::{AppError, AppResult};

// =============================================================================
// Validation Constants
// =============================================================================

/// Maximum length (in characters) of a city or location name.
pub const MAX_LOCATION_LENGTH: usize = 100;

/// Minimum length of a username accepted by `/auth/token`.
pub const MIN_USERNAME_LENGTH: usize = 3;

/// Maximum length of a username accepted by `/auth/token`.
pub const MAX_USERNAME_LENGTH: usize = 64;

/// Maximum number of favourite cities stored per user.
pub const MAX_FAVORITE_CITIES: usize = 20;

/// Turn a city name into the slug used by the urban-areas API.
///
/// Lowercases the input and replaces every run of whitespace with a single
/// hyphen, so `"New  York City"` becomes `"new-york-city"`. Surrounding
/// whitespace is not trimmed.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut in_whitespace = false;

    for c in name.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                slug.push('-');
            }
            in_whitespace = true;
        } else {
            slug.extend(c.to_lowercase());
            in_whitespace = false;
        }
    }

    slug
}

/// Validate a city or location name taken from a path or query parameter.
///
/// Rules:
/// - Must contain a non-whitespace character
/// - Must not exceed [`MAX_LOCATION_LENGTH`] characters
/// - Must not contain control characters
pub fn validate_location(name: &str, field: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{field} cannot be empty")));
    }

    if name.chars().count() > MAX_LOCATION_LENGTH {
        return Err(AppError::BadRequest(format!(
            "{field} cannot exceed {MAX_LOCATION_LENGTH} characters"
        )));
    }

    if name.chars().any(char::is_control) {
        return Err(AppError::BadRequest(format!(
            "{field} contains control characters"
        )));
    }

    Ok(())
}

/// Validate a latitude/longitude pair.
pub fn validate_coordinates(lat: f64, lon: f64) -> AppResult<()> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(AppError::BadRequest(format!(
            "lat must be between -90 and 90, got {lat}"
        )));
    }

    if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
        return Err(AppError::BadRequest(format!(
            "lon must be between -180 and 180, got {lon}"
        )));
    }

    Ok(())
}

/// Validate a username.
///
/// Rules:
/// - Between 3 and 64 characters
/// - ASCII alphanumerics, dots, underscores and hyphens only
pub fn validate_username(username: &str) -> AppResult<()> {
    let len = username.chars().count();
    if !(MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&len) {
        return Err(AppError::BadRequest(format!(
            "username must be between {MIN_USERNAME_LENGTH} and {MAX_USERNAME_LENGTH} characters"
        )));
    }

    if let Some((i, c)) = username
        .chars()
        .enumerate()
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
    {
        return Err(AppError::BadRequest(format!(
            "username contains invalid character '{c}' at position {i}"
        )));
    }

    Ok(())
}

/// Validate a list of favourite cities.
pub fn validate_favorite_cities(cities: &[String]) -> AppResult<()> {
    if cities.len() > MAX_FAVORITE_CITIES {
        return Err(AppError::BadRequest(format!(
            "at most {MAX_FAVORITE_CITIES} favorite cities are allowed"
        )));
    }

    cities
        .iter()
        .try_for_each(|city| validate_location(city, "favorite city"))
}
