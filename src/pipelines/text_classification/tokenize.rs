use burn::data::dataset::{Dataset, InMemDataset};
use derive_new::new;
use serde::{Deserialize, Serialize};
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

use super::Item;

/// Number of records handed to the tokenizer at once
pub const BATCH_SIZE: usize = 1000;

/// A record with its token ids and attention mask
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct Tokenized {
    /// The source text
    pub input: String,

    /// The class id
    pub label: usize,

    /// Token ids, padded or truncated to the configured max length
    pub input_ids: Vec<u32>,

    /// 1 for real tokens, 0 for padding
    pub attention_mask: Vec<u32>,
}

/// Configure a tokenizer to pad every sequence to `max_length` and truncate longer ones
pub fn configure_tokenizer(
    mut tokenizer: Tokenizer,
    max_length: usize,
    pad_id: u32,
) -> anyhow::Result<Tokenizer> {
    let pad_token = tokenizer
        .id_to_token(pad_id)
        .unwrap_or_else(|| PaddingParams::default().pad_token);

    tokenizer.with_padding(Some(PaddingParams {
        strategy: PaddingStrategy::Fixed(max_length),
        pad_id,
        pad_token,
        ..Default::default()
    }));

    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length,
            ..Default::default()
        }))
        .map_err(|e| anyhow!("Unable to configure truncation: {}", e))?;

    Ok(tokenizer)
}

/// Tokenize every record of a dataset, in batches of [`BATCH_SIZE`]
///
/// The tokenizer is expected to come from [`configure_tokenizer`], so every record ends up with
/// the same number of token ids.
pub fn tokenize<I, D>(dataset: &D, tokenizer: &Tokenizer) -> anyhow::Result<InMemDataset<Tokenized>>
where
    I: Item,
    D: Dataset<I>,
{
    let records: Vec<I> = dataset.iter().collect();
    let mut items = Vec::with_capacity(records.len());

    for chunk in records.chunks(BATCH_SIZE) {
        let inputs: Vec<&str> = chunk.iter().map(|record| record.input()).collect();

        let encodings = tokenizer
            .encode_batch(inputs, true)
            .map_err(|e| anyhow!("Unable to tokenize batch: {}", e))?;

        for (record, encoding) in chunk.iter().zip(encodings) {
            items.push(Tokenized::new(
                record.input().to_string(),
                record.label(),
                encoding.get_ids().to_vec(),
                encoding.get_attention_mask().to_vec(),
            ));
        }
    }

    Ok(InMemDataset::new(items))
}
