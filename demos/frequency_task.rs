extern crate claimfreq;
extern crate log;
extern crate serde_json;
extern crate simple_logger;

use std::env;
use std::error::Error;

use claimfreq::config::ExperimentConfig;
use claimfreq::openml_api::fetch_dataset;
use claimfreq::preprocessing::glm_features;
use claimfreq::prelude::*;
use claimfreq::procedures::{FrozenSets, Holdout};

fn main() -> Result<(), Box<dyn Error>> {
    simple_logger::init_with_level(log::Level::Info)?;

    // optional path to a JSON experiment configuration
    let config = match env::args().nth(1) {
        Some(path) => ExperimentConfig::from_file(path)?,
        None => ExperimentConfig::default(),
    };

    // Load freMTPL2freq (https://www.openml.org/d/41214)
    let data = fetch_dataset(config.dataset_id, &config.caps)?;
    let data = glm_features(&data)?;

    // freeze the split so later sessions score on the same policies
    let holdout = Holdout::new(data.len(), config.train_fraction, config.seed)?;
    let split_path = env::temp_dir().join(format!("fremtpl2freq-split-{}.json", config.seed));
    FrozenSets::from_fold(holdout.into_fold()).save(&split_path)?;
    let folds = FrozenSets::load(&split_path, data.len())?;

    let task = FrequencyTask::new("freMTPL2freq", data, Box::new(folds));
    println!("Task: {}", task.name());

    let with_offset = config.fit_spec(ModelKind::Homogeneous);
    let mut without_offset = with_offset.clone();
    without_offset.offset_column = None;

    let board = task.compare(
        &BaselineService,
        &[
            ("homogeneous", with_offset),
            ("homogeneous, no offset", without_offset),
        ],
    )?;

    println!("Poisson deviance\n{}", board);
    println!("{}", serde_json::to_string_pretty(&board)?);

    Ok(())
}
