//! Adapt Bert for Sequence Classification to the Text Classification pipeline

use std::{collections::BTreeMap, path::PathBuf};

use bert_burn::model::BertModelConfig;
use burn::{
    config::Config as _,
    nn::{DropoutConfig, LinearConfig},
    tensor::backend::Backend,
};

use crate::pipelines::text_classification;

use super::Model;

/// The Model Configuration
#[derive(burn::config::Config)]
pub struct Config {
    // -- Fields copied from BertModelConfig because #[serde(flatten)] is not supported yet
    /// Number of attention heads in the multi-head attention
    pub num_attention_heads: usize,
    /// Number of transformer encoder layers/blocks
    pub num_hidden_layers: usize,
    /// Layer normalization epsilon
    pub layer_norm_eps: f64,
    /// Size of bert embedding (e.g., 768 for bert-base)
    pub hidden_size: usize,
    /// Size of the intermediate position wise feedforward layer
    pub intermediate_size: usize,
    /// Size of the vocabulary
    pub vocab_size: usize,
    /// Max position embeddings, for BERT equal to max_seq_len (512)
    pub max_position_embeddings: usize,
    /// Identifier for sentence type in input (e.g., 0 for single sentence, 1 for pair)
    pub type_vocab_size: usize,
    /// Dropout value across layers, typically 0.1. Also applied before the classification head
    pub hidden_dropout_prob: f64,
    /// BERT model name (bert)
    pub model_type: String,
    /// Index of the padding token
    pub pad_token_id: usize,
    /// Maximum sequence length for the tokenizer
    pub max_seq_len: Option<usize>,
    /// Whether to add a pooling layer to the model
    pub with_pooling_layer: Option<bool>,
    // -- End fields copied from BertModelConfig
    /// A map from class ids to class name labels
    pub id2label: BTreeMap<usize, String>,
}

impl Config {
    /// Combine a base BERT configuration with the class labels of a task
    pub fn new_with_labels(model: BertModelConfig, labels: &[String]) -> Self {
        let id2label = labels
            .iter()
            .enumerate()
            .map(|(i, s)| (i, s.trim().to_string()))
            .collect();

        Config::new(
            model.num_attention_heads,
            model.num_hidden_layers,
            model.layer_norm_eps,
            model.hidden_size,
            model.intermediate_size,
            model.vocab_size,
            model.max_position_embeddings,
            model.type_vocab_size,
            model.hidden_dropout_prob,
            model.model_type,
            model.pad_token_id,
            id2label,
        )
        .with_max_seq_len(model.max_seq_len)
        .with_with_pooling_layer(model.with_pooling_layer)
    }

    /// Get the Bert model configuration
    pub fn get_bert_config(&self) -> BertModelConfig {
        BertModelConfig::new(
            self.num_attention_heads,
            self.num_hidden_layers,
            self.layer_norm_eps,
            self.hidden_size,
            self.intermediate_size,
            self.vocab_size,
            self.max_position_embeddings,
            self.type_vocab_size,
            self.hidden_dropout_prob,
            self.model_type.clone(),
            self.pad_token_id,
        )
        .with_max_seq_len(self.max_seq_len)
        .with_with_pooling_layer(self.with_pooling_layer)
    }

    /// Initialize the model with random weights
    pub fn init<B: Backend>(&self, device: &B::Device) -> Model<B> {
        let model = self.get_bert_config().init(device);

        let n_classes = self.id2label.len();

        let dropout = DropoutConfig::new(self.hidden_dropout_prob).init();
        let output = LinearConfig::new(self.hidden_size, n_classes).init(device);

        Model {
            model,
            dropout,
            output,
            n_classes,
        }
    }
}

impl text_classification::ModelConfig for Config {
    /// Load a pretrained model configuration
    fn load_pretrained(config_file: PathBuf, labels: &[String]) -> anyhow::Result<Self> {
        let mut bert_config = BertModelConfig::load(config_file)
            .map_err(|e| anyhow!("Unable to load Hugging Face Config file: {}", e))?;

        // Enable the pooling layer for sequence classification
        bert_config.with_pooling_layer = Some(true);

        let model_config = Config::new_with_labels(bert_config, labels);

        if model_config.id2label.is_empty() {
            return Err(anyhow!("Classes are not defined in the model configuration"));
        }

        Ok(model_config)
    }

    fn get_config(&self) -> text_classification::Config {
        text_classification::Config {
            pad_token_id: self.pad_token_id,
            max_position_embeddings: self.max_position_embeddings,
            max_seq_len: self.max_seq_len,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::fs;

    use burn::config::Config as _;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{datasets::poem_sentiment, pipelines::text_classification::ModelConfig};

    /// A BERT small enough to run in unit tests
    pub(crate) fn tiny_config() -> Config {
        Config::new(2, 1, 1e-12, 8, 16, 10, 16, 2, 0.0, "bert".to_string(), 0, {
            poem_sentiment::labels().into_iter().enumerate().collect()
        })
        .with_with_pooling_layer(Some(true))
    }

    #[test]
    fn loads_hugging_face_config_with_labels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{
                "architectures": ["BertForMaskedLM"],
                "attention_probs_dropout_prob": 0.1,
                "hidden_act": "gelu",
                "hidden_dropout_prob": 0.1,
                "hidden_size": 768,
                "initializer_range": 0.02,
                "intermediate_size": 3072,
                "layer_norm_eps": 1e-12,
                "max_position_embeddings": 512,
                "model_type": "bert",
                "num_attention_heads": 12,
                "num_hidden_layers": 12,
                "pad_token_id": 0,
                "type_vocab_size": 2,
                "vocab_size": 28996
            }"#,
        )
        .unwrap();

        let config = Config::load_pretrained(path, &poem_sentiment::labels()).unwrap();

        assert_eq!(config.id2label.len(), 4);
        assert_eq!(config.id2label[&2], "no_impact");
        assert_eq!(config.with_pooling_layer, Some(true));

        let pipeline_config = config.get_config();
        assert_eq!(pipeline_config.pad_token_id, 0);
        assert_eq!(pipeline_config.max_length(), 512);
    }

    #[test]
    fn requires_labels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        tiny_config().get_bert_config().save(&path).unwrap();

        assert!(Config::load_pretrained(path, &[]).is_err());
    }
}
