use std::path::PathBuf;

use bert_burn::{
    data::BertInferenceBatch,
    model::{BertModel, BertModelOutput},
};
use burn::{
    config::Config as _,
    module::Module,
    nn::{loss::CrossEntropyLossConfig, Dropout, Linear},
    record::{CompactRecorder, Recorder},
    tensor::{
        activation::softmax,
        backend::{AutodiffBackend, Backend},
        Int, Tensor,
    },
    train::ClassificationOutput,
};
use derive_new::new;

use crate::pipelines::text_classification;

use super::Config;

/// BERT for Text Classification
#[derive(Module, Debug, new)]
pub struct Model<B: Backend> {
    /// The base BERT model
    pub model: BertModel<B>,

    /// Dropout applied to the pooled output
    pub dropout: Dropout,

    /// Linear layer for text classification
    pub output: Linear<B>,

    /// Total number of classes
    pub n_classes: usize,
}

/// Define model behavior
impl<B: Backend> Model<B> {
    /// Defines forward pass for training
    pub fn forward(
        &self,
        input: BertInferenceBatch<B>,
        targets: Tensor<B, 1, Int>,
    ) -> ClassificationOutput<B> {
        let device = &self.model.devices()[0];

        let targets = targets.to_device(device);

        let output = self.logits(input);

        let loss = CrossEntropyLossConfig::new()
            .init(&output.device())
            .forward(output.clone(), targets.clone());

        ClassificationOutput {
            loss,
            output,
            targets,
        }
    }

    /// Defines forward pass for inference, returning class probabilities
    pub fn infer(&self, input: BertInferenceBatch<B>) -> Tensor<B, 2> {
        softmax(self.logits(input), 1)
    }

    /// Raw class scores: [batch_size, n_classes]
    fn logits(&self, input: BertInferenceBatch<B>) -> Tensor<B, 2> {
        let [batch_size, _seq_length] = input.tokens.dims();

        let BertModelOutput {
            pooled_output,
            hidden_states,
        } = self.model.forward(input);

        // Without a pooler, classify from the first ([CLS]) token
        let pooled = self.dropout.forward(pooled_output.unwrap_or(hidden_states));

        self.output
            .forward(pooled)
            .slice([0..batch_size, 0..1])
            .reshape([batch_size, self.n_classes])
    }
}

impl<B: AutodiffBackend> text_classification::Model<B> for Model<B> {
    /// The model configuration
    type Config = Config;

    /// Load a model from a file
    fn load_from_safetensors(
        device: &B::Device,
        model_file: PathBuf,
        config: Self::Config,
    ) -> anyhow::Result<Self> {
        if config.id2label.is_empty() {
            return Err(anyhow!("Classes are not defined in the model configuration"));
        }

        let mut model = config.init(device);

        let record = BertModel::from_safetensors(model_file, device, config.get_bert_config());
        model.model = model.model.load_record(record);

        Ok(model)
    }
}

/// Load a fine-tuned model and its configuration from a directory written by
/// [`save_pretrained`](crate::pipelines::text_classification::training::save_pretrained)
pub fn load<B: Backend>(
    artifact_dir: &str,
    device: &B::Device,
) -> anyhow::Result<(Model<B>, Config)> {
    let config = Config::load(format!("{artifact_dir}/config.json"))
        .map_err(|e| anyhow!("Unable to load config file: {}", e))?;

    let record = Recorder::<B>::load(
        &CompactRecorder::new(),
        format!("{artifact_dir}/model").into(),
        device,
    )
    .map_err(|e| anyhow!("Unable to load trained model weights: {}", e))?;

    let model = config.init::<B>(device).load_record(record);

    Ok((model, config))
}

#[cfg(test)]
mod tests {
    use burn::{
        backend::{Autodiff, NdArray},
        data::{
            dataloader::batcher::Batcher as _,
            dataset::{Dataset, InMemDataset},
        },
        module::AutodiffModule,
        train::{TrainStep, ValidStep},
    };
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        datasets,
        models::bert::text_classification::config::tests::tiny_config,
        pipelines::text_classification::{
            batcher::Train,
            configure_tokenizer, tokenize,
            tokenize::{tests::word_tokenizer, Tokenized},
            training::save_pretrained,
            Batcher,
        },
    };

    type B = NdArray;

    fn tokenized() -> Vec<Tokenized> {
        let dataset = InMemDataset::new(vec![
            datasets::Item::new("with pale blue berries".to_string(), 1),
            datasets::Item::new("pale".to_string(), 2),
        ]);
        let tokenizer = configure_tokenizer(word_tokenizer(), 8, 0).unwrap();

        tokenize(&dataset, &tokenizer).unwrap().iter().collect()
    }

    #[test]
    fn infers_class_probabilities() {
        let device = Default::default();
        let model = tiny_config().init::<B>(&device);
        let batch = Batcher::<B>::new(0, device).infer(&tokenized());

        let probabilities = model.infer(BertInferenceBatch {
            tokens: batch.tokens,
            mask_pad: batch.mask_pad,
        });

        assert_eq!(probabilities.dims(), [2, 4]);

        let sums = probabilities.sum_dim(1).into_data().convert::<f32>().value;
        for sum in sums {
            assert!((sum - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn steps_produce_a_finite_loss() {
        let device = Default::default();
        let model = tiny_config().init::<Autodiff<B>>(&device);

        let batch: Train<Autodiff<B>> = Batcher::new(0, device).batch(tokenized());
        let output = TrainStep::step(&model, batch);
        assert!(output.item.loss.into_scalar().is_finite());

        let batch: Train<B> = Batcher::new(0, Default::default()).batch(tokenized());
        let output = ValidStep::step(&model.valid(), batch);
        assert_eq!(output.output.dims(), [2, 4]);
        assert_eq!(
            output.targets.into_data().convert::<i64>().value,
            vec![1, 2]
        );
    }

    #[tokio::test]
    async fn reloads_a_saved_model() {
        let dir = tempfile::tempdir().unwrap();
        let save_dir = dir.path().to_str().unwrap();
        let device = Default::default();

        let config = tiny_config();
        let model = config.init::<B>(&device);
        let tokenizer = configure_tokenizer(word_tokenizer(), 8, 0).unwrap();

        save_pretrained::<B, _, _>(model.clone(), &config, &tokenizer, save_dir)
            .await
            .unwrap();

        assert!(dir.path().join("config.json").exists());
        assert!(dir.path().join("tokenizer.json").exists());

        let (loaded, loaded_config) = load::<B>(save_dir, &device).unwrap();
        assert_eq!(loaded_config.id2label, config.id2label);

        let batch = Batcher::<B>::new(0, device).infer(&tokenized());
        let input = || BertInferenceBatch {
            tokens: batch.tokens.clone(),
            mask_pad: batch.mask_pad.clone(),
        };

        let expected = model.infer(input()).into_data().convert::<f32>().value;
        let actual = loaded.infer(input()).into_data().convert::<f32>().value;
        // Weights are stored at half precision
        for (a, e) in actual.iter().zip(expected.iter()) {
            assert!((a - e).abs() < 1e-2);
        }
    }
}
