use std::path::PathBuf;

use hf_hub::{
    api::tokio::{Api, ApiError},
    Repo, RepoType,
};
use tokenizers::Tokenizer;

/// Revision holding the Parquet export that the Hub generates for every dataset
const PARQUET_REVISION: &str = "refs/convert/parquet";

/// Download model config and weights from Hugging Face Hub
/// If file exists in cache, it will not be downloaded again
// NOTE: Modified from the built-in function to work within an already-async context
pub async fn download_hf_model(model_name: &str) -> anyhow::Result<(PathBuf, PathBuf)> {
    let api = Api::new()?;
    let repo = api.model(model_name.to_string());

    let model_filepath = repo.get("model.safetensors").await.map_err(|e| {
        anyhow!(
            "Failed to download: {} weights with name: model.safetensors from HuggingFace Hub: {}",
            model_name,
            e
        )
    })?;

    let config_filepath = repo.get("config.json").await.map_err(|e| {
        anyhow!(
            "Failed to download: {} config with name: config.json from HuggingFace Hub: {}",
            model_name,
            e
        )
    })?;

    Ok((config_filepath, model_filepath))
}

/// Download the Parquet file for one split of a Hugging Face Hub dataset
///
/// Datasets uploaded as Parquet keep their files under `data/`. Anything else is looked up in the
/// automatic Parquet conversion branch.
pub async fn download_hf_dataset_split(dataset: &str, split: &str) -> Result<PathBuf, ApiError> {
    let api = Api::new()?;

    let repo = api.repo(Repo::new(dataset.to_string(), RepoType::Dataset));
    if let Ok(path) = repo
        .get(&format!("data/{split}-00000-of-00001.parquet"))
        .await
    {
        return Ok(path);
    }

    log::debug!("No data/ parquet file for {dataset}/{split}, trying {PARQUET_REVISION}");

    api.repo(Repo::with_revision(
        dataset.to_string(),
        RepoType::Dataset,
        PARQUET_REVISION.to_string(),
    ))
    .get(&format!("default/{split}/0000.parquet"))
    .await
}

/// Load the tokenizer published alongside a model on the Hugging Face Hub
pub fn load_tokenizer(model_name: &str) -> anyhow::Result<Tokenizer> {
    Tokenizer::from_pretrained(model_name, None)
        .map_err(|e| anyhow!("Unable to load tokenizer for {}: {}", model_name, e))
}
