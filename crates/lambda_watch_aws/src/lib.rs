//! AWS-facing collaborators around the invocation log correlation engine.
//!
//! This crate owns the runtime integration details the core crate leaves out:
//! CloudWatch Logs and Lambda adapters, function packaging and deployment,
//! configuration, event templates, terminal display, and the `lambda_watch`
//! command-line entry point.

pub mod adapters;
pub mod config;
pub mod display;
pub mod function_config;
pub mod handlers;
pub mod logging;
pub mod packaging;
pub mod templates;
