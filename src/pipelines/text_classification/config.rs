use burn::LearningRate;

/// Define configuration struct for the experiment
#[derive(burn::config::Config)]
pub struct Training {
    /// Batch size for training
    #[config(default = 8)]
    pub batch_size: usize,

    /// Batch size for validation and test evaluation
    #[config(default = 8)]
    pub eval_batch_size: usize,

    /// Number of epochs
    #[config(default = 3)]
    pub num_epochs: usize,

    /// Initial learning rate, decayed linearly to zero over the run
    #[config(default = 5e-5)]
    pub learning_rate: LearningRate,

    /// Adam beta 1
    #[config(default = 0.9)]
    pub adam_beta1: f32,

    /// Adam beta 2
    #[config(default = 0.999)]
    pub adam_beta2: f32,

    /// Adam epsilon
    #[config(default = 1e-8)]
    pub adam_epsilon: f32,

    /// Decoupled weight decay
    #[config(default = 0.0)]
    pub weight_decay: f32,

    /// Gradient norm clipping threshold
    #[config(default = 1.0)]
    pub max_grad_norm: f32,

    /// Seed for weight initialization and shuffling
    #[config(default = 42)]
    pub seed: u64,

    /// The location of the top-level data directory
    #[config(default = "\"data\".to_string()")]
    pub data_dir: String,

    /// Where checkpoints, metric logs and test results are written
    #[config(default = "\"test_trainer\".to_string()")]
    pub output_dir: String,

    /// Where the final model is saved
    #[config(default = "\"pretrained_model\".to_string()")]
    pub save_dir: String,

    /// Show the terminal dashboard rather than logging metrics
    #[config(default = true)]
    pub use_tui: bool,

    /// Model name (e.g., "google-bert/bert-base-cased")
    pub model_name: String,

    /// Class labels, indexed by class id
    pub labels: Vec<String>,
}

impl Training {
    /// Number of batches in one epoch over `n_items` loaded by `num_workers` workers
    ///
    /// The data loader gives each worker an equal share of the items, the last one also taking
    /// the remainder, and every share ends with its own partial batch.
    pub fn steps_per_epoch(&self, n_items: usize, num_workers: usize) -> usize {
        let batch_size = self.batch_size.max(1);
        let num_workers = num_workers.max(1);

        let share = n_items / num_workers;
        let last = n_items - share * (num_workers - 1);

        share.div_ceil(batch_size) * (num_workers - 1) + last.div_ceil(batch_size)
    }

    /// Number of optimizer steps for a training set of `n_items`
    pub fn total_steps(&self, n_items: usize, num_workers: usize) -> usize {
        (self.steps_per_epoch(n_items, num_workers) * self.num_epochs).max(1)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn config() -> Training {
        Training::new(
            "google-bert/bert-base-cased".to_string(),
            vec!["negative".to_string(), "positive".to_string()],
        )
    }

    #[test]
    fn defaults_follow_the_usual_fine_tuning_recipe() {
        let config = config();

        assert_eq!(config.batch_size, 8);
        assert_eq!(config.num_epochs, 3);
        assert_eq!(config.learning_rate, 5e-5);
        assert_eq!(config.seed, 42);
        assert_eq!(config.output_dir, "test_trainer");
        assert_eq!(config.save_dir, "pretrained_model");
        assert_eq!(config.data_dir, "data");
    }

    #[test]
    fn total_steps_rounds_partial_batches_up() {
        let config = config().with_num_epochs(2);

        assert_eq!(config.total_steps(17, 1), 6);
        assert_eq!(config.total_steps(16, 1), 4);
        assert_eq!(config.total_steps(0, 1), 1);
    }

    #[test]
    fn every_worker_share_ends_with_a_partial_batch() {
        let config = config();

        // Shares of 5, 5 and 7 items: 1 + 1 + 1 batches of 8
        assert_eq!(config.steps_per_epoch(17, 3), 3);

        // Shares of 10 and 10: 2 + 2, not ceil(20 / 8) = 3
        assert_eq!(config.steps_per_epoch(20, 2), 4);

        // More workers than items: only the last share holds anything
        assert_eq!(config.steps_per_epoch(3, 8), 1);

        // Zero workers load on a single thread
        assert_eq!(config.steps_per_epoch(17, 0), 3);
        assert_eq!(config.total_steps(20, 2), 12);
    }
}
