use std::path::Path;

use burn::data::dataset::{Dataset, InMemDataset};

use super::{check_label, DatasetError, Item};

/// The name of the annotated CSV inside the data directory
pub static FILE_NAME: &str = "all_too_well.csv";

/// Read the annotated verses from a CSV file with a header row
///
/// The file needs a `verse_text` column and a `label` (or `labels`) column following the Poem
/// Sentiment class ids. Other columns are ignored.
pub fn load<P: AsRef<Path>>(path: P) -> Result<InMemDataset<Item>, DatasetError> {
    let path = path.as_ref();
    let reader = csv::ReaderBuilder::new();

    let dataset: InMemDataset<Item> =
        InMemDataset::from_csv(path, &reader).map_err(|source| DatasetError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

    for (row, item) in dataset.iter().enumerate() {
        check_label(item.labels as i64, row)?;
    }

    log::info!("Loaded {} records from {}", dataset.len(), path.display());

    Ok(dataset)
}
