use burn::train::renderer::{MetricState, MetricsRenderer, TrainingProgress};
use derive_new::new;
use log::Level;

/// A renderer for TUI-disabled runs which forwards metric updates to the log
#[derive(new)]
pub struct Simple {}

impl Simple {
    fn log_state(split: &str, state: MetricState, level: Level) {
        match state {
            MetricState::Numeric(entry, value) => {
                log::log!(level, "[{split}] {}: {:.4}", entry.name, value);
            }
            MetricState::Generic(entry) => {
                log::log!(level, "[{split}] {}: {}", entry.name, entry.formatted);
            }
        }
    }

    fn log_progress(split: &str, item: &TrainingProgress) {
        log::debug!(
            "[{split}] epoch {}/{} - iteration {} ({}/{} items)",
            item.epoch,
            item.epoch_total,
            item.iteration,
            item.progress.items_processed,
            item.progress.items_total
        );
    }
}

impl MetricsRenderer for Simple {
    fn update_train(&mut self, state: MetricState) {
        // Updated every iteration
        Self::log_state("train", state, Level::Debug);
    }

    fn update_valid(&mut self, state: MetricState) {
        Self::log_state("valid", state, Level::Info);
    }

    fn render_train(&mut self, item: TrainingProgress) {
        Self::log_progress("train", &item);
    }

    fn render_valid(&mut self, item: TrainingProgress) {
        Self::log_progress("valid", &item);
    }
}
