use std::sync::Arc;

use burn::{
    data::dataloader::DataLoader,
    tensor::backend::Backend,
    train::{ClassificationOutput, ValidStep},
};

use super::{
    batcher::Train,
    metrics::{compute_metrics, Accuracy, EvalPrediction, MetricError, Metrics},
};

/// Run the model over every batch of a data loader, collecting logits and reference class ids
pub fn predict<B, M>(model: &M, dataloader: Arc<dyn DataLoader<Train<B>>>) -> EvalPrediction
where
    B: Backend,
    M: ValidStep<Train<B>, ClassificationOutput<B>>,
{
    let mut eval_pred = EvalPrediction::default();

    for batch in dataloader.iter() {
        let ClassificationOutput {
            output, targets, ..
        } = ValidStep::step(model, batch);

        let [_batch_size, n_classes] = output.dims();

        let logits = output.into_data().convert::<f32>().value;
        let labels = targets
            .into_data()
            .convert::<i64>()
            .value
            .into_iter()
            .map(|label| label as usize);

        eval_pred.extend(&logits, n_classes, labels);
    }

    eval_pred
}

/// Run the model over every batch of a data loader and score its predictions
pub fn evaluate<B, M>(
    model: &M,
    dataloader: Arc<dyn DataLoader<Train<B>>>,
    metric: &Accuracy,
) -> Result<Metrics, MetricError>
where
    B: Backend,
    M: ValidStep<Train<B>, ClassificationOutput<B>>,
{
    compute_metrics(&predict(model, dataloader), metric)
}

#[cfg(test)]
mod tests {
    use burn::{
        backend::NdArray,
        data::{
            dataloader::{batcher::Batcher as _, DataLoaderBuilder},
            dataset::{Dataset, InMemDataset},
        },
    };
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        datasets,
        models::bert::text_classification::config::tests::tiny_config,
        pipelines::text_classification::{
            configure_tokenizer, tokenize, tokenize::tests::word_tokenizer, Batcher, Tokenized,
        },
    };

    type B = NdArray;

    fn tokenized() -> InMemDataset<Tokenized> {
        let dataset = InMemDataset::new(vec![
            datasets::Item::new("with pale blue berries".to_string(), 1),
            datasets::Item::new("pale".to_string(), 2),
            datasets::Item::new("blue berries".to_string(), 0),
            datasets::Item::new("with".to_string(), 3),
            datasets::Item::new("berries with pale".to_string(), 1),
        ]);
        let tokenizer = configure_tokenizer(word_tokenizer(), 8, 0).unwrap();

        tokenize(&dataset, &tokenizer).unwrap()
    }

    #[test]
    fn scores_every_item_across_partial_batches() {
        let device = Default::default();
        let model = tiny_config().init::<B>(&device);
        let batcher = Batcher::<B>::new(0, device);

        // Each item on its own, as the reference
        let mut expected = EvalPrediction::default();
        for item in tokenized().iter() {
            let output = ValidStep::step(&model, batcher.batch(vec![item]));
            let [_, n_classes] = output.output.dims();
            let logits = output.output.into_data().convert::<f32>().value;
            let labels = output.targets.into_data().convert::<i64>().value;

            expected.extend(&logits, n_classes, labels.into_iter().map(|l| l as usize));
        }

        // Five items in batches of two leave a partial last batch
        let dataloader = DataLoaderBuilder::new(batcher).batch_size(2).build(tokenized());

        let eval_pred = predict(&model, dataloader.clone());

        assert_eq!(eval_pred.labels, vec![1, 2, 0, 3, 1]);
        assert_eq!(eval_pred.logits.len(), 5);
        assert!(eval_pred.logits.iter().all(|row| row.len() == 4));

        for (row, expected_row) in eval_pred.logits.iter().zip(expected.logits.iter()) {
            for (a, e) in row.iter().zip(expected_row) {
                assert!((a - e).abs() < 1e-4);
            }
        }

        let metrics = evaluate(&model, dataloader, &Accuracy).unwrap();

        assert_eq!(metrics, compute_metrics(&expected, &Accuracy).unwrap());
    }
}
