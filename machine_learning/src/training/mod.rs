mod builder;
mod stats;
mod trainer;

pub use builder::{SequentialTrainer, TrainerBuilder, TrainerSpec};
pub use stats::EpochStats;
pub use trainer::Trainer;
