use std::{fs::File, path::Path};

use arrow::{
    array::{Array, Int64Array, StringArray},
    compute::cast,
    datatypes::DataType,
    record_batch::RecordBatch,
};
use burn::data::dataset::InMemDataset;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::utils::hugging_face::download_hf_dataset_split;

use super::{check_label, DatasetError, Item, Split};

/// The Hub identifier of the Poem Sentiment dataset
pub static DATASET: &str = "google-research-datasets/poem_sentiment";

/// Class names, indexed by class id
pub static LABELS: [&str; 4] = ["negative", "positive", "no_impact", "mixed"];

/// The column holding the verse
pub static TEXT_COLUMN: &str = "verse_text";

/// Accepted names for the label column, upstream name first
pub static LABEL_COLUMNS: [&str; 2] = ["label", "labels"];

/// Class names as owned strings, in class id order
pub fn labels() -> Vec<String> {
    LABELS.iter().map(|label| label.to_string()).collect()
}

/// Download and read one split
pub async fn load(split: Split) -> Result<InMemDataset<Item>, DatasetError> {
    let path = download_hf_dataset_split(DATASET, split.as_str())
        .await
        .map_err(|source| DatasetError::Download {
            dataset: DATASET.to_string(),
            split,
            source,
        })?;

    let items = read_parquet(&path)?;

    log::info!("Loaded {} records from {}/{}", items.len(), DATASET, split);

    Ok(InMemDataset::new(items))
}

/// Read verses and labels from a Parquet file
pub fn read_parquet<P: AsRef<Path>>(path: P) -> Result<Vec<Item>, DatasetError> {
    let file = File::open(path.as_ref()).map_err(|source| DatasetError::Io {
        path: path.as_ref().to_path_buf(),
        source,
    })?;

    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    let schema = builder.schema().clone();
    let available: Vec<String> = schema.fields().iter().map(|f| f.name().clone()).collect();

    let text_idx = schema
        .index_of(TEXT_COLUMN)
        .map_err(|_| DatasetError::MissingColumn {
            column: TEXT_COLUMN.to_string(),
            available: available.clone(),
        })?;

    let label_idx = LABEL_COLUMNS
        .iter()
        .find_map(|name| schema.index_of(name).ok())
        .ok_or_else(|| DatasetError::MissingColumn {
            column: LABEL_COLUMNS[0].to_string(),
            available,
        })?;

    let mut items = Vec::new();

    for batch in builder.build()? {
        let batch = batch?;
        read_batch(&batch, text_idx, label_idx, &mut items)?;
    }

    Ok(items)
}

fn read_batch(
    batch: &RecordBatch,
    text_idx: usize,
    label_idx: usize,
    items: &mut Vec<Item>,
) -> Result<(), DatasetError> {
    // ClassLabel columns are stored with varying integer widths
    let texts = cast(batch.column(text_idx), &DataType::Utf8)?;
    let labels = cast(batch.column(label_idx), &DataType::Int64)?;

    let texts = texts
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| arrow::error::ArrowError::CastError(TEXT_COLUMN.to_string()))?;

    let labels = labels
        .as_any()
        .downcast_ref::<Int64Array>()
        .ok_or_else(|| arrow::error::ArrowError::CastError(LABEL_COLUMNS[0].to_string()))?;

    for i in 0..batch.num_rows() {
        let row = items.len();

        if texts.is_null(i) {
            return Err(DatasetError::NullValue {
                column: TEXT_COLUMN.to_string(),
                row,
            });
        }

        if labels.is_null(i) {
            return Err(DatasetError::NullValue {
                column: LABEL_COLUMNS[0].to_string(),
                row,
            });
        }

        let label = check_label(labels.value(i), row)?;

        items.push(Item::new(texts.value(i).to_string(), label));
    }

    Ok(())
}
