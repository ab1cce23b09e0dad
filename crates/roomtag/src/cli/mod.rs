//! Command handlers for the `roomtag` binary.

pub mod classify;
pub mod config;
pub mod interactive;
pub mod serve;
