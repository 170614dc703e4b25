//! # Verse Sentiment
//!
//! Fine-tune BERT on the Poem Sentiment dataset with Burn and evaluate it on hand-annotated
//! "All Too Well" verses.
#![forbid(unsafe_code)]

/// Models
pub mod models;

/// Pipelines
pub mod pipelines;

/// Datasets
pub mod datasets;

/// Utilities
pub mod utils;

/// Error macros
#[macro_use]
extern crate anyhow;
