//! Service plumbing shared by Phonepass binaries: config loading, health
//! probes, request-id/trace middleware and tracing setup.

pub mod config;
pub mod health;
pub mod middleware;
pub mod tracing;
