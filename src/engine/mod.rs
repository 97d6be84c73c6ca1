pub mod baseline;
pub mod classifier;
pub mod columns;
pub mod config;
pub mod geometry;
pub mod matchers;
pub mod overlay;
pub mod page;
pub mod postprocess;
pub mod resolve;
pub mod text;

pub use config::ExtractionConfig;
pub use geometry::{GeometryDocument, GeometryProvider};
pub use page::extract_document;
