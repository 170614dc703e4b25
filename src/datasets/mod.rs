use std::{fmt::Display, path::PathBuf};

use burn::data::dataset::{transform::ComposedDataset, Dataset, InMemDataset};
use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::pipelines::text_classification;

/// The Poem Sentiment dataset from the Hugging Face Hub
pub mod poem_sentiment;

/// The hand-annotated "All Too Well" verses used as the test set
pub mod all_too_well;

/// A verse with its sentiment class id
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct Item {
    /// The verse to classify
    pub verse_text: String,

    /// The sentiment class id, renamed from the upstream `label` column
    #[serde(alias = "label")]
    pub labels: usize,
}

impl text_classification::Item for Item {
    fn input(&self) -> &str {
        &self.verse_text
    }

    fn label(&self) -> usize {
        self.labels
    }
}

/// The named splits of a dataset
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Split {
    /// Training split
    Train,

    /// Validation split
    Validation,

    /// Held-out test split
    Test,
}

impl Split {
    /// The name of the split on the Hugging Face Hub
    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Validation => "validation",
            Split::Test => "test",
        }
    }
}

impl Display for Split {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The training split, concatenated from two upstream splits
pub type Merged = ComposedDataset<InMemDataset<Item>>;

/// The three splits used for fine-tuning
pub struct Splits {
    /// Upstream train followed by upstream test
    pub train: Merged,

    /// Upstream validation, unchanged
    pub validation: InMemDataset<Item>,

    /// The annotated CSV
    pub test: InMemDataset<Item>,
}

/// Concatenate two splits, keeping `first` before `second` and the order within each
pub fn merge_splits(first: InMemDataset<Item>, second: InMemDataset<Item>) -> Merged {
    ComposedDataset::new(vec![first, second])
}

/// Load the train, validation and test splits
///
/// The upstream test split is folded into training because the annotated CSV serves as the
/// held-out test set. The local CSV is read first so that a missing file fails before anything is
/// downloaded.
pub async fn get_train_dev_test_data(data_dir: &str) -> Result<Splits, DatasetError> {
    let test = all_too_well::load(format!("{}/{}", data_dir, all_too_well::FILE_NAME))?;

    let upstream_train = poem_sentiment::load(Split::Train).await?;
    let upstream_test = poem_sentiment::load(Split::Test).await?;
    let validation = poem_sentiment::load(Split::Validation).await?;

    let train = merge_splits(upstream_train, upstream_test);

    log::info!(
        "Loaded {} train, {} validation and {} test records",
        train.len(),
        validation.len(),
        test.len()
    );

    Ok(Splits {
        train,
        validation,
        test,
    })
}

/// Dataset Error
#[derive(thiserror::Error, Debug)]
pub enum DatasetError {
    /// The Hub could not provide the requested file
    #[error("unable to download {dataset}/{split}: {source}")]
    Download {
        /// Dataset identifier
        dataset: String,
        /// Split name
        split: Split,
        /// Underlying Hub error
        source: hf_hub::api::tokio::ApiError,
    },

    /// A CSV file was missing or malformed
    #[error("unable to read {}: {source}", .path.display())]
    Csv {
        /// Location of the file
        path: PathBuf,
        /// Underlying I/O or parsing error
        source: std::io::Error,
    },

    /// A Parquet file could not be opened
    #[error("unable to open {}: {source}", .path.display())]
    Io {
        /// Location of the file
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// A Parquet file could not be decoded
    #[error(transparent)]
    Parquet(#[from] parquet::errors::ParquetError),

    /// An Arrow column could not be converted
    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),

    /// A required column was absent
    #[error("column {column} not found, available columns: {available:?}")]
    MissingColumn {
        /// The required column
        column: String,
        /// The columns that were found
        available: Vec<String>,
    },

    /// A required value was null
    #[error("null {column} in row {row}")]
    NullValue {
        /// The column holding the null
        column: String,
        /// Zero-based row index
        row: usize,
    },

    /// A label was outside the label space
    #[error("label {label} in row {row} is outside of 0..{n_classes}")]
    LabelOutOfRange {
        /// The offending label
        label: i64,
        /// Zero-based row index
        row: usize,
        /// Number of classes
        n_classes: usize,
    },
}

/// Check that a raw label belongs to the label space
pub(crate) fn check_label(label: i64, row: usize) -> Result<usize, DatasetError> {
    let n_classes = poem_sentiment::LABELS.len();

    match usize::try_from(label) {
        Ok(id) if id < n_classes => Ok(id),
        _ => Err(DatasetError::LabelOutOfRange {
            label,
            row,
            n_classes,
        }),
    }
}
