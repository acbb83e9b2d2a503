//! Library entrypoint for github-daily-report.
//!
//! The primary interface is the `github-daily-report` binary. This lib target
//! exposes the pipeline (resolve, fetch, render, publish) to the binary and to
//! integration tests.

pub mod config;
pub mod fetch;
pub mod github;
pub mod http;
pub mod model;
pub mod notion;
pub mod onboarding;
pub mod output;
pub mod report;
pub mod resolver;
pub mod window;

#[cfg(test)]
mod test_support;
