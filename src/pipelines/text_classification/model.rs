use std::{fmt::Display, path::PathBuf};

use burn::{
    module::AutodiffModule,
    tensor::backend::AutodiffBackend,
    train::{ClassificationOutput, TrainStep},
};

use super::batcher::Train;

/// The common model configuration properties needed for the pipeline
#[derive(Debug, Clone)]
pub struct Config {
    /// The padding token ID
    pub pad_token_id: usize,

    /// The max position embeddings
    pub max_position_embeddings: usize,

    /// An optional max sequence length, if different from max position embeddings
    pub max_seq_len: Option<usize>,
}

impl Config {
    /// The fixed length every tokenized sequence is padded or truncated to
    pub fn max_length(&self) -> usize {
        self.max_seq_len.unwrap_or(self.max_position_embeddings)
    }
}

/// A trait for models that can be used for Text Classification
pub trait Model<B>:
    AutodiffModule<B> + TrainStep<Train<B>, ClassificationOutput<B>> + Display
where
    B: AutodiffBackend,
{
    /// The model configuration
    type Config: ModelConfig;

    /// Load pre-trained base weights from a safetensors file, leaving the classification head
    /// freshly initialized
    fn load_from_safetensors(
        device: &B::Device,
        model_file: PathBuf,
        config: Self::Config,
    ) -> anyhow::Result<Self>;
}

/// A trait for configs that can be used for Text Classification models
pub trait ModelConfig: burn::config::Config + Clone {
    /// Load a pretrained model configuration and attach the class labels
    fn load_pretrained(config_file: PathBuf, labels: &[String]) -> anyhow::Result<Self>;

    /// Return the Config needed for the text classification pipeline
    fn get_config(&self) -> Config;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max_seq_len: Option<usize>) -> Config {
        Config {
            pad_token_id: 0,
            max_position_embeddings: 512,
            max_seq_len,
        }
    }

    #[test]
    fn max_length_defaults_to_position_embeddings() {
        assert_eq!(config(None).max_length(), 512);
        assert_eq!(config(Some(128)).max_length(), 128);
    }
}
