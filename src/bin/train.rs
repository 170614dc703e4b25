//! Command line tool to fine-tune BERT on Poem Sentiment

use burn::backend::{libtorch::LibTorchDevice, Autodiff, LibTorch};
use pico_args::Arguments;
use verse_sentiment::{
    datasets::{self, poem_sentiment},
    models::bert,
    pipelines::text_classification,
};

const HELP: &str = "\
Usage: train [OPTIONS]

Options:
  -h, --help           Print help
  -n, --num-epochs     Number of epochs to train for (defaults to 3)
  -b, --batch-size     Batch size (defaults to 8)
  -d, --data-dir       The directory holding all_too_well.csv (defaults to 'data')
  --cpu                Train on the CPU even when a CUDA device is available
  --no-tui             Disable TUI, logging metrics instead
";

#[derive(Debug)]
struct Args {
    num_epochs: Option<usize>,
    batch_size: Option<usize>,
    data_dir: Option<String>,
    cpu: bool,
    use_tui: bool,
}

impl Args {
    fn parse() -> anyhow::Result<Option<Self>> {
        let mut pargs = Arguments::from_env();

        // Help has a higher priority and should be handled separately.
        if pargs.contains(["-h", "--help"]) {
            return Ok(None);
        }

        let args = Args {
            num_epochs: pargs.opt_value_from_str(["-n", "--num-epochs"])?,
            batch_size: pargs.opt_value_from_str(["-b", "--batch-size"])?,
            data_dir: pargs.opt_value_from_str(["-d", "--data-dir"])?,
            cpu: pargs.contains("--cpu"),
            use_tui: !(pargs.contains("--no-tui")),
        };

        let remaining = pargs.finish();
        if !remaining.is_empty() {
            return Err(anyhow::anyhow!("Unexpected arguments: {:?}", remaining));
        }

        Ok(Some(args))
    }
}

/// The first CUDA device when there is one, unless the CPU was requested
fn select_device(cpu: bool, cuda_available: bool) -> LibTorchDevice {
    if cpu || !cuda_available {
        LibTorchDevice::Cpu
    } else {
        LibTorchDevice::Cuda(0)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Some(args) = Args::parse()? else {
        print!("{}", HELP);

        return Ok(());
    };

    let mut logger = pretty_env_logger::formatted_builder();
    logger.filter_level(log::LevelFilter::Info);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        logger.parse_filters(&filters);
    }
    logger.init();

    let mut config = text_classification::Config::new(
        bert::BASE_CASED.to_string(),
        poem_sentiment::labels(),
    );

    if let Some(num_epochs) = args.num_epochs {
        config.num_epochs = num_epochs;
    }

    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
        config.eval_batch_size = batch_size;
    }

    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }

    config.use_tui = args.use_tui;

    let splits = datasets::get_train_dev_test_data(&config.data_dir).await?;

    let device = select_device(args.cpu, tch::Cuda::is_available());
    log::info!("Training on {:?}", device);

    let metrics = text_classification::train::<
        Autodiff<LibTorch>,
        bert::text_classification::Model<Autodiff<LibTorch>>,
        datasets::Item,
        _,
        _,
        _,
    >(vec![device], splits.train, splits.validation, splits.test, config)
    .await?;

    log::info!("Test accuracy: {:.4}", metrics.accuracy);

    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn falls_back_to_cpu_without_cuda() {
        assert_eq!(select_device(false, false), LibTorchDevice::Cpu);
    }

    #[test]
    fn prefers_cuda_unless_cpu_is_requested() {
        assert_eq!(select_device(false, true), LibTorchDevice::Cuda(0));
        assert_eq!(select_device(true, true), LibTorchDevice::Cpu);
    }
}
