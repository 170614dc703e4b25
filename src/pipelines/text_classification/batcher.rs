use burn::{
    data::dataloader,
    tensor::{backend::Backend, Bool, Int, Tensor},
};
use derive_new::new;

use crate::utils::tensors;

use super::tokenize::Tokenized;

/// An inference batch for text classification
#[derive(Debug, Clone, new)]
pub struct Infer<B: Backend> {
    /// Tokenized text as 2D tensor: [batch_size, max_seq_length]
    pub tokens: Tensor<B, 2, Int>,

    /// Padding mask for the tokenized text containing booleans for padding locations
    pub mask_pad: Tensor<B, 2, Bool>,
}

/// A training batch for text classification
#[derive(Clone, Debug, new)]
pub struct Train<B: Backend> {
    /// Bert Model input
    pub input: Infer<B>,

    /// Class ids for the batch
    pub targets: Tensor<B, 1, Int>,
}

/// Struct for batching tokenized text classification items
#[derive(Clone, new)]
pub struct Batcher<B: Backend> {
    /// ID of the padding token, used for sequences shorter than the batch
    pad_token_id: u32,

    /// Device on which to perform computation (e.g., CPU or CUDA device)
    device: B::Device,
}

impl<B: Backend> Batcher<B> {
    /// Collects tokenized items into an inference batch
    pub fn infer(&self, items: &[Tokenized]) -> Infer<B> {
        let seq_length = items
            .iter()
            .map(|item| item.input_ids.len())
            .max()
            .unwrap_or(0);

        let token_ids: Vec<&[u32]> = items.iter().map(|item| item.input_ids.as_slice()).collect();
        let attention: Vec<&[u32]> = items
            .iter()
            .map(|item| item.attention_mask.as_slice())
            .collect();

        let tokens = tensors::pad_to::<B>(self.pad_token_id, &token_ids, seq_length, &self.device);
        let mask_pad =
            tensors::pad_to::<B>(0, &attention, seq_length, &self.device).equal_elem(0);

        Infer { tokens, mask_pad }
    }
}

/// Implement Batcher trait for Batcher struct for training
impl<B: Backend> dataloader::batcher::Batcher<Tokenized, Train<B>> for Batcher<B> {
    /// Collects a vector of tokenized items into a training batch
    fn batch(&self, items: Vec<Tokenized>) -> Train<B> {
        let input = self.infer(&items);

        let class_ids: Vec<usize> = items.iter().map(|item| item.label).collect();
        let targets = tensors::int_vector::<B>(&class_ids, &self.device);

        Train { input, targets }
    }
}

#[cfg(test)]
mod tests {
    use burn::{backend::NdArray, data::dataloader::batcher::Batcher as _};
    use pretty_assertions::assert_eq;

    use super::*;

    type B = NdArray;

    fn item(input_ids: Vec<u32>, attention_mask: Vec<u32>, label: usize) -> Tokenized {
        Tokenized::new(String::new(), label, input_ids, attention_mask)
    }

    #[test]
    fn batches_tokens_mask_and_targets() {
        let batcher = Batcher::<B>::new(0, Default::default());

        let batch: Train<B> = batcher.batch(vec![
            item(vec![2, 3, 0, 0], vec![1, 1, 0, 0], 1),
            item(vec![4, 5, 6, 0], vec![1, 1, 1, 0], 3),
        ]);

        assert_eq!(batch.input.tokens.dims(), [2, 4]);
        assert_eq!(
            batch.input.tokens.into_data().convert::<i64>().value,
            vec![2, 3, 0, 0, 4, 5, 6, 0]
        );
        assert_eq!(
            batch.input.mask_pad.into_data().value,
            vec![false, false, true, true, false, false, false, true]
        );
        assert_eq!(
            batch.targets.into_data().convert::<i64>().value,
            vec![1, 3]
        );
    }
}
