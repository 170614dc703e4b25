use burn::{
    config::Config as _,
    data::{dataloader::DataLoaderBuilder, dataset::Dataset},
    grad_clipping::GradientClippingConfig,
    lr_scheduler::linear::LinearLrSchedulerConfig,
    module::{AutodiffModule, Module},
    optim::AdamWConfig,
    record::{CompactRecorder, Recorder},
    tensor::backend::{AutodiffBackend, Backend},
    train::{
        metric::{AccuracyMetric, LearningRateMetric, LossMetric},
        ClassificationOutput, LearnerBuilder, ValidStep,
    },
};
use tokenizers::Tokenizer;

use crate::utils::{hugging_face, renderer};

use super::{
    batcher::Train,
    config,
    evaluation::evaluate,
    metrics::{Accuracy, Metrics},
    tokenize::{configure_tokenizer, tokenize},
    Batcher, Item, Model, ModelConfig,
};

/// Training Config
pub type Config = config::Training;

/// Fine-tune a pre-trained model, evaluate it on the test split and save it
///
/// Validation runs at the end of every epoch. Checkpoints and metric logs go to
/// `config.output_dir`, the final model, its config and the tokenizer to `config.save_dir`.
pub async fn train<B, M, I, DT, DV, DE>(
    devices: Vec<B::Device>, // Device on which to perform computation (e.g., CPU or CUDA device)
    dataset_train: DT,       // Training dataset
    dataset_valid: DV,       // Validation dataset
    dataset_test: DE,        // Held-out test dataset
    config: Config,          // Experiment configuration
) -> anyhow::Result<Metrics>
where
    B: AutodiffBackend,
    M: Model<B> + 'static,
    I: Item + 'static,
    DT: Dataset<I>,
    DV: Dataset<I>,
    DE: Dataset<I>,
    M::InnerModule: ValidStep<
        Train<<B as AutodiffBackend>::InnerBackend>,
        ClassificationOutput<<B as AutodiffBackend>::InnerBackend>,
    >,
{
    let device = devices
        .first()
        .cloned()
        .ok_or_else(|| anyhow!("At least one device is required for training"))?;

    B::seed(config.seed);

    tokio::fs::create_dir_all(&config.output_dir).await?;
    config
        .save(format!("{}/config.json", config.output_dir))
        .map_err(|e| anyhow!("Unable to save training config: {}", e))?;

    log::info!("Downloading {}", config.model_name);
    let (config_file, model_file) = hugging_face::download_hf_model(&config.model_name).await?;

    let model_config = M::Config::load_pretrained(config_file, &config.labels)
        .map_err(|e| anyhow!("Unable to load pre-trained model config file: {}", e))?;
    let pipeline_config = model_config.get_config();

    // Initialize tokenizer
    let tokenizer = configure_tokenizer(
        hugging_face::load_tokenizer(&config.model_name)?,
        pipeline_config.max_length(),
        pipeline_config.pad_token_id as u32,
    )?;

    let tokenized_train = tokenize(&dataset_train, &tokenizer)?;
    let tokenized_valid = tokenize(&dataset_valid, &tokenizer)?;
    let tokenized_test = tokenize(&dataset_test, &tokenizer)?;

    log::info!(
        "Tokenized {} train, {} validation and {} test records to length {}",
        tokenized_train.len(),
        tokenized_valid.len(),
        tokenized_test.len(),
        pipeline_config.max_length()
    );

    let workers: usize = std::thread::available_parallelism()?.into();

    // Each worker's share of the data ends with its own partial batch
    let total_steps = config.total_steps(tokenized_train.len(), workers);

    let model = M::load_from_safetensors(&device, model_file, model_config.clone())?;

    // Initialize batchers for training and evaluation data
    let pad_token_id = pipeline_config.pad_token_id as u32;
    let batcher_train = Batcher::<B>::new(pad_token_id, device.clone());
    let batcher_valid = Batcher::<B::InnerBackend>::new(pad_token_id, device.clone());

    // Initialize data loaders
    let dataloader_train = DataLoaderBuilder::new(batcher_train)
        .batch_size(config.batch_size)
        .shuffle(config.seed)
        .num_workers(workers)
        .build(tokenized_train);

    let dataloader_valid = DataLoaderBuilder::new(batcher_valid.clone())
        .batch_size(config.eval_batch_size)
        .num_workers(workers)
        .build(tokenized_valid);

    let dataloader_test = DataLoaderBuilder::new(batcher_valid)
        .batch_size(config.eval_batch_size)
        .num_workers(workers)
        .build(tokenized_test);

    // Initialize optimizer
    let optimizer = AdamWConfig::new()
        .with_beta_1(config.adam_beta1)
        .with_beta_2(config.adam_beta2)
        .with_epsilon(config.adam_epsilon)
        .with_weight_decay(config.weight_decay)
        .with_grad_clipping(Some(GradientClippingConfig::Norm(config.max_grad_norm)))
        .init();

    // Initialize learning rate scheduler
    let lr_scheduler = LinearLrSchedulerConfig::new(config.learning_rate, 0.0, total_steps).init();

    // Initialize learner
    let mut builder = LearnerBuilder::new(&config.output_dir)
        .metric_train_numeric(AccuracyMetric::new())
        .metric_valid_numeric(AccuracyMetric::new())
        .metric_train_numeric(LossMetric::new())
        .metric_valid_numeric(LossMetric::new())
        .metric_train_numeric(LearningRateMetric::new())
        .with_file_checkpointer(CompactRecorder::new())
        .devices(devices)
        .num_epochs(config.num_epochs)
        .summary();

    if !config.use_tui {
        builder = builder.renderer(renderer::Simple::new());
    }

    let learner = builder.build(model, optimizer, lr_scheduler);

    // Train the model
    let model_trained = learner.fit(dataloader_train, dataloader_valid);

    let metrics = evaluate(&model_trained.valid(), dataloader_test, &Accuracy)?;
    log::info!("Test accuracy: {:.4}", metrics.accuracy);

    tokio::fs::write(
        format!("{}/test_results.json", config.output_dir),
        serde_json::to_string_pretty(&metrics)?,
    )
    .await?;

    save_pretrained::<B, M, _>(model_trained, &model_config, &tokenizer, &config.save_dir).await?;

    Ok(metrics)
}

/// Save the model configuration, weights and tokenizer to a directory
pub async fn save_pretrained<B, M, C>(
    model: M,
    model_config: &C,
    tokenizer: &Tokenizer,
    save_dir: &str,
) -> anyhow::Result<()>
where
    B: Backend,
    M: Module<B>,
    C: burn::config::Config,
{
    tokio::fs::create_dir_all(save_dir).await?;

    model_config
        .save(format!("{save_dir}/config.json"))
        .map_err(|e| anyhow!("Unable to save model config: {}", e))?;

    Recorder::<B>::record(
        &CompactRecorder::new(),
        model.into_record(),
        format!("{save_dir}/model").into(),
    )
    .map_err(|e| anyhow!("Unable to save trained model weights: {}", e))?;

    tokenizer
        .save(format!("{save_dir}/tokenizer.json"), false)
        .map_err(|e| anyhow!("Unable to save tokenizer: {}", e))?;

    log::info!("Saved trained model to {save_dir}");

    Ok(())
}
