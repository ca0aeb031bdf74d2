//! Auth types shared across Phonepass services.
//!
//! Provides the bearer token key format and the `BearerCredential` extractor.

pub mod credential;
pub mod token;
