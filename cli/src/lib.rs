//! surf-vcr-cli library - exposes modules for unit and integration tests

pub mod commands;
pub mod http;
