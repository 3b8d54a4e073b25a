//! HTTP middleware for the request pipeline.
//!
//! - **JSON Body Parsing**: rejects malformed JSON before routing
//! - **Auth Context**: decodes an optional bearer token into an [`AuthContext`]
//! - **Verified User**: extractor for routes that act on behalf of a caller
//!
//! Request IDs, CORS and request logging come from `tower-http`; see
//! [`crate::routes`] for the order in which everything is stacked.
//!
//! ```text
//! Request → Request ID → CORS → Body Parse → Trace/Metrics → Auth Context → Router
//!                                   ↓
//!                              400 / 413 envelope
//! ```

pub mod auth;
pub mod body;

pub use auth::{
    AuthContext, AuthContextLayer, Claims, VerifiedUser, auth_context_from_headers,
    bearer_token, decode_claims_unverified,
};
pub use body::{JsonBody, ParsedBody, is_json_content_type, parse_json_body};
