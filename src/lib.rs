//! Classify scanned copyright notices as genuine or false positive, and
//! declutter them into structured `{year, holder}` and license fields.
//!
//! # Flow
//! - predict: raw text → [`normalize::Normalizer`] → [`features::FittedVocabulary`]
//!   → [`classifier::Classifier`] → [`models::Label`]
//! - declutter: raw text → [`declutter::Extractor`] → [`models::ExtractionResult`]
//! - train: labelled raw text → normalize → fit features → fit classifier →
//!   [`agent::TrainedModel`], persisted by [`agent::store`]
//!
//! [`agent::Agent`] is the entry point for all of the above.

pub mod agent;
pub mod classifier;
pub mod config;
pub mod declutter;
pub mod error;
pub mod features;
pub mod metrics;
pub mod models;
pub mod normalize;
pub mod records;
pub mod report;

pub use agent::{Agent, ModelSource};
pub use error::{Result, SieveError};
pub use models::{CopyrightEntry, ExtractionResult, Label, NormalizedNotice};
