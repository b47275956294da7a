//! Cross-module integration tests

mod pipeline_integration;
