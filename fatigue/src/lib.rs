pub mod checkpoint;
pub mod classifier;
pub mod config;
pub mod error;
pub mod export;
pub mod loader;
pub mod pipeline;
pub mod preprocess;
pub mod split;
pub mod test_data;
pub mod visualizer;

pub use config::FatigueConfig;
pub use error::{FatigueError, Result};
pub use pipeline::{ExportedModel, MouseFatigue, SavedModel};
