pub mod classification;

pub use classification::{ClassificationResult, ExtractionResult};
