//! Signed session tokens.
//!
//! Two token classes, signed with independent HMAC secrets:
//!
//! - `access`: short-lived, presented on every API call
//! - `refresh`: long-lived, only ever exchanged for a new pair
//!
//! A token of one class never verifies as the other, both because the
//! secrets differ and because the `class` claim is checked explicitly.

mod issuer;

pub use issuer::{Claims, TokenClass, TokenConfig, TokenError, TokenIssuer, TokenPair};
