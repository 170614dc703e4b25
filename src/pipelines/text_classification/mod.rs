/// Common model config and traits for text classification
pub mod model;

/// Batcher
pub mod batcher;

/// Text Classification Items
pub mod item;

/// Tokenization of dataset splits
pub mod tokenize;

/// Accuracy and the metrics callback
pub mod metrics;

/// Evaluation over a data loader
pub mod evaluation;

/// Training configuration
pub mod config;

/// Training
pub mod training;

pub use batcher::Batcher;
pub use item::Item;
pub use metrics::{compute_metrics, Accuracy, EvalPrediction, Metrics};
pub use model::{Config, Model, ModelConfig};
pub use tokenize::{configure_tokenizer, tokenize, Tokenized};
pub use training::train;
