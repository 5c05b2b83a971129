//! Experiment settings, read from a JSON file. Any field left out takes the value of the
//! reference run on freMTPL2freq.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;

use crate::dataset::{Caps, CLAIM_COUNT_COLUMN, EXPOSURE_COLUMN};
use crate::error::{Error, Result};
use crate::service::{FitSpec, ModelKind};

/// OpenML id of freMTPL2freq
pub const FREMTPL2FREQ: u32 = 41214;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub dataset_id: u32,
    pub caps: Caps,
    pub train_fraction: f64,
    pub seed: u64,
    pub target_column: String,
    pub offset_column: Option<String>,
    pub predictor_columns: Vec<String>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        ExperimentConfig {
            dataset_id: FREMTPL2FREQ,
            caps: Caps::default(),
            train_fraction: 0.9,
            seed: 1,
            target_column: CLAIM_COUNT_COLUMN.to_owned(),
            offset_column: Some(EXPOSURE_COLUMN.to_owned()),
            predictor_columns: [
                "Area",
                "VehPower",
                "VehAge",
                "DrivAge",
                "BonusMalus",
                "VehBrand",
                "VehGas",
                "Density",
                "Region",
            ]
            .iter()
            .map(|&s| s.to_owned())
            .collect(),
        }
    }
}

impl ExperimentConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let config: ExperimentConfig = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        info!("Loaded experiment configuration from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.caps.validate()?;
        if !(self.train_fraction > 0.0 && self.train_fraction < 1.0) {
            return Err(Error::invalid(format!(
                "train_fraction must lie in (0, 1), got {}",
                self.train_fraction
            )));
        }
        Ok(())
    }

    /// Fit specification for `kind` with the configured columns.
    pub fn fit_spec(&self, kind: ModelKind) -> FitSpec {
        let spec =
            FitSpec::new(self.target_column.clone(), kind).predictors(self.predictor_columns.clone());
        match self.offset_column {
            Some(ref col) => spec.offset(col.clone()),
            None => spec,
        }
    }
}

impl FromStr for ExperimentConfig {
    type Err = Error;

    fn from_str(source: &str) -> Result<Self> {
        let config: ExperimentConfig = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }
}

#[test]
fn empty_object_gives_reference_run() {
    let config = "{}".parse::<ExperimentConfig>().unwrap();
    assert_eq!(config, ExperimentConfig::default());
    assert_eq!(config.dataset_id, 41214);
    assert_eq!(config.caps.claim_count, 4);
    assert_eq!(config.train_fraction, 0.9);
}

#[test]
fn partial_override() {
    let config: ExperimentConfig =
        r#"{ "seed": 2018, "caps": { "claim_count": 5, "exposure": 1.0 }, "offset_column": null }"#
            .parse()
            .unwrap();

    assert_eq!(config.seed, 2018);
    assert_eq!(config.caps.claim_count, 5);
    assert_eq!(config.offset_column, None);
    assert_eq!(config.target_column, "ClaimNb");

    let spec = config.fit_spec(ModelKind::Gbm);
    assert_eq!(spec.offset_column, None);
    assert_eq!(spec.predictor_columns.len(), 9);
}

#[test]
fn out_of_range_values_are_rejected() {
    for source in &[
        r#"{ "train_fraction": 1.0 }"#,
        r#"{ "train_fraction": 0 }"#,
        r#"{ "caps": { "claim_count": 4, "exposure": 2.0 } }"#,
    ] {
        match source.parse::<ExperimentConfig>() {
            Err(Error::InvalidArgument(_)) => {}
            other => panic!("{}: expected InvalidArgument, got {:?}", source, other),
        }
    }
}

#[test]
fn config_files() {
    use std::env;
    use std::fs;

    let good = env::temp_dir().join(format!("claimfreq-config-{}.json", ::std::process::id()));
    fs::write(&good, r#"{ "seed": 7, "train_fraction": 0.8 }"#).unwrap();
    let config = ExperimentConfig::from_file(&good);
    let _ = fs::remove_file(&good);

    let config = config.unwrap();
    assert_eq!(config.seed, 7);
    assert_eq!(config.train_fraction, 0.8);
    assert_eq!(config.dataset_id, FREMTPL2FREQ);

    let bad = env::temp_dir().join(format!("claimfreq-bad-config-{}.json", ::std::process::id()));
    fs::write(&bad, r#"{ "seed": "seven" }"#).unwrap();
    let result = ExperimentConfig::from_file(&bad);
    let _ = fs::remove_file(&bad);
    match result {
        Err(Error::JsonError(_)) => {}
        other => panic!("expected JsonError, got {:?}", other),
    }

    match ExperimentConfig::from_file(env::temp_dir().join("claimfreq-no-such-config.json")) {
        Err(Error::IoError(_)) => {}
        other => panic!("expected IoError, got {:?}", other),
    }
}
