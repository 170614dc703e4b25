/// BERT for Text Classification (such as sentiment analysis)
pub mod text_classification;

/// The model fine-tuned by default
pub static BASE_CASED: &str = "google-bert/bert-base-cased";
