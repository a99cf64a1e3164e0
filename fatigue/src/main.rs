use anyhow::Context;
use env_logger::Env;
use log::info;

use fatigue::{FatigueConfig, MouseFatigue, config::CONFIG_PATH};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = FatigueConfig::from_file_or_default(CONFIG_PATH)
        .with_context(|| format!("failed to load {CONFIG_PATH}"))?;

    let mut mouse_fatigue = MouseFatigue::new(config).context("failed to read the data set")?;

    if mouse_fatigue.config().visualize {
        mouse_fatigue
            .data_visualization()
            .context("failed to visualize the data set")?;
    }

    let saved = mouse_fatigue
        .neural_network(true)
        .context("failed to train the model")?
        .context("the trained model was not saved")?;

    let exported = mouse_fatigue
        .convert_model(&saved)
        .context("failed to convert the saved model")?;

    info!(
        "done: {} ({} bytes) and {}",
        exported.model_path.display(),
        exported.model_len,
        exported.header_path.display()
    );

    Ok(())
}
