use serde::{Deserialize, Serialize};

/// Raw model outputs and reference class ids for a set of examples
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EvalPrediction {
    /// One row of class scores per example
    pub logits: Vec<Vec<f32>>,

    /// Reference class id per example
    pub labels: Vec<usize>,
}

impl EvalPrediction {
    /// Append a flat `[batch_size, n_classes]` block of logits and its labels
    pub fn extend(&mut self, logits: &[f32], n_classes: usize, labels: impl IntoIterator<Item = usize>) {
        self.logits
            .extend(logits.chunks(n_classes.max(1)).map(|row| row.to_vec()));
        self.labels.extend(labels);
    }
}

/// Scores computed for an evaluation run
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Fraction of examples whose predicted class matches the reference
    pub accuracy: f64,
}

/// The accuracy metric
#[derive(Clone, Copy, Debug, Default)]
pub struct Accuracy;

impl Accuracy {
    /// Fraction of predictions equal to their reference
    pub fn compute(&self, predictions: &[usize], references: &[usize]) -> Result<f64, MetricError> {
        if predictions.len() != references.len() {
            return Err(MetricError::LengthMismatch {
                predictions: predictions.len(),
                references: references.len(),
            });
        }

        if predictions.is_empty() {
            return Err(MetricError::Empty);
        }

        let correct = predictions
            .iter()
            .zip(references)
            .filter(|(prediction, reference)| prediction == reference)
            .count();

        Ok(correct as f64 / predictions.len() as f64)
    }
}

/// The index of the largest value, the first one on ties
///
/// A NaN counts as the largest value.
pub fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;

    for (index, &value) in values.iter().enumerate() {
        if value.is_nan() {
            return Some(index);
        }

        match best {
            Some((_, max)) if value <= max => {}
            _ => best = Some((index, value)),
        }
    }

    best.map(|(index, _)| index)
}

/// Pick the class with the largest logit for every example and score it against the references
pub fn compute_metrics(eval_pred: &EvalPrediction, metric: &Accuracy) -> Result<Metrics, MetricError> {
    let predictions = eval_pred
        .logits
        .iter()
        .enumerate()
        .map(|(row, logits)| argmax(logits).ok_or(MetricError::EmptyLogits { row }))
        .collect::<Result<Vec<_>, _>>()?;

    let accuracy = metric.compute(&predictions, &eval_pred.labels)?;

    Ok(Metrics { accuracy })
}

/// Metric Error
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum MetricError {
    /// Nothing to score
    #[error("no examples to evaluate")]
    Empty,

    /// A row of logits had no classes
    #[error("empty logits in row {row}")]
    EmptyLogits {
        /// Zero-based row index
        row: usize,
    },

    /// Predictions and references differ in count
    #[error("{predictions} predictions for {references} references")]
    LengthMismatch {
        /// Number of predictions
        predictions: usize,
        /// Number of references
        references: usize,
    },
}
