//! # ADMS Common Library
//!
//! Shared code for the admissions services including:
//! - Application models (rows, summaries, status enums)
//! - Change-event types (RowChange enum) and the ChangeFeed bus
//! - Configuration loading
//! - Timestamp parsing helpers

pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod time;

pub use error::{Error, Result};
