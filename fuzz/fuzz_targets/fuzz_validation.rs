//! Fuzz testing for request input handling.
//!
//! Feeds arbitrary strings to everything that sees raw client input before a
//! handler does: city slugs, location and username checks, and the bearer
//! token decoder. None of them may panic.
//!
//! # Running the Fuzz Tests
//!
//! ```bash
//! cargo +nightly install cargo-fuzz
//! cargo +nightly fuzz run fuzz_validation -- -max_total_time=60
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;
use lamb_api::middleware::decode_claims_unverified;
use lamb_api::validation::{slugify, validate_location, validate_username};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let slug = slugify(s);
        assert!(!slug.chars().any(char::is_whitespace));

        let _ = validate_location(s, "city");
        let _ = validate_username(s);
        let _ = decode_claims_unverified(s);
    }
});
