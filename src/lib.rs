//! Taxonomy module classification over short document metadata, backed by
//! the fastText supervised classifier.
//!
//! A "module" is a two-part taxonomy code such as `S1_M1` or `S4.M17`. The
//! crate turns CSV rows of article metadata into fastText training lines,
//! trains and evaluates models, and decodes predicted labels back into
//! structured [`Module`] values.
//!
//! # Predicting
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use taxoclass::Classifier;
//!
//! let classifier = Classifier::from_file("classifier.model.ftz")?;
//! for prediction in classifier.predict_text("A study of reef adaptation", 3)? {
//!     println!("{} ({:.3})", prediction.module, prediction.prob);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Training
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::path::Path;
//! use taxoclass::Trainer;
//!
//! let trainer = Trainer::new();
//! trainer.train(Path::new("articles.csv"), Path::new("classifier.model.ftz"))?;
//! # Ok(())
//! # }
//! ```
//!
//! Rows are labeled through a `module_id_for_all` column holding codes in
//! either delimiter convention (`s1.m1`, `S1_M1`, ...); see
//! [`preprocess::TextConfig`] for the knobs.

pub mod classifier;
pub mod model_manager;
pub mod models;
pub mod preprocess;
pub mod taxonomy;

pub use classifier::{
    Classifier, ClassifierError, ClassifierInfo, Evaluation, Prediction, Trainer, TrainingParams,
};
pub use model_manager::{ModelError, ModelManager};
pub use models::{BuiltinModel, ModelInfo};
pub use preprocess::{clean, fasttext_line, PreprocessError, Row, TextConfig};
pub use taxonomy::{Module, ModuleMatcher, TaxonomyError};

pub fn init_logger() {
    env_logger::init();
}
