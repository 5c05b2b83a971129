//! Feature transforms used to prepare freMTPL2freq records for a Poisson GLM.
//!
//! Continuous risk factors with a non-monotone effect on claim frequency are banded into
//! categories; the others are capped or log-transformed.

use crate::dataset::{Dataset, Feature, Record};
use crate::error::{Error, Result};

const VEH_POWER_CAP: f64 = 9.0;
const BONUS_MALUS_CAP: f64 = 150.0;

/// Upper bounds of the driver age bands, inclusive
const DRIV_AGE_BANDS: [(f64, &str); 6] = [
    (20.0, "18-20"),
    (25.0, "21-25"),
    (30.0, "26-30"),
    (40.0, "31-40"),
    (50.0, "41-50"),
    (70.0, "51-70"),
];

/// Transform every record of `data` into GLM-ready features.
pub fn glm_features(data: &Dataset) -> Result<Dataset> {
    data.try_map(glm_record)
}

fn glm_record(r: &Record) -> Result<Record> {
    let veh_power = numeric(r, "VehPower")?.min(VEH_POWER_CAP);
    let veh_age = numeric(r, "VehAge")?;
    let driv_age = numeric(r, "DrivAge")?;
    let bonus_malus = numeric(r, "BonusMalus")?.min(BONUS_MALUS_CAP);
    let density = numeric(r, "Density")?;

    if !(density > 0.0) {
        return Err(Error::invalid(format!("Density must be positive, got {}", density)));
    }

    let mut out = r.clone();
    out.features.insert("VehPower".into(), Feature::Categorical(format!("{}", veh_power)));
    out.features.insert("VehAge".into(), Feature::Categorical(veh_age_band(veh_age).into()));
    out.features.insert("DrivAge".into(), Feature::Categorical(driv_age_band(driv_age).into()));
    out.features.insert("BonusMalus".into(), Feature::Numeric(bonus_malus));
    out.features.insert("Density".into(), Feature::Numeric(density.ln()));
    Ok(out)
}

fn numeric(r: &Record, name: &str) -> Result<f64> {
    match r.feature(name) {
        Some(&Feature::Numeric(x)) => Ok(x),
        Some(&Feature::Categorical(_)) => {
            Err(Error::invalid(format!("feature {} is not numeric", name)))
        }
        None => Err(Error::invalid(format!("missing feature {}", name))),
    }
}

fn veh_age_band(age: f64) -> &'static str {
    if age < 1.0 {
        "0"
    } else if age <= 10.0 {
        "1-10"
    } else {
        "11+"
    }
}

fn driv_age_band(age: f64) -> &'static str {
    DRIV_AGE_BANDS
        .iter()
        .find(|&&(upper, _)| age <= upper)
        .map(|&(_, label)| label)
        .unwrap_or("71+")
}

#[cfg(test)]
fn policy(veh_power: f64, veh_age: f64, driv_age: f64, bonus_malus: f64, density: f64) -> Record {
    Record::new(0, 1.0)
        .with_feature("VehPower", Feature::Numeric(veh_power))
        .with_feature("VehAge", Feature::Numeric(veh_age))
        .with_feature("DrivAge", Feature::Numeric(driv_age))
        .with_feature("BonusMalus", Feature::Numeric(bonus_malus))
        .with_feature("Density", Feature::Numeric(density))
        .with_feature("Region", Feature::Categorical("R11".into()))
}

#[test]
fn bands_and_caps() {
    use crate::dataset::Caps;

    let data = Dataset::new(
        vec![policy(12.0, 0.0, 19.0, 230.0, 1.0), policy(5.0, 15.0, 85.0, 50.0, 100.0)],
        &Caps::default(),
    )
    .unwrap();

    let out = glm_features(&data).unwrap();
    let a = &out.records()[0];
    let b = &out.records()[1];

    assert_eq!(a.feature("VehPower").and_then(Feature::as_str), Some("9"));
    assert_eq!(a.feature("VehAge").and_then(Feature::as_str), Some("0"));
    assert_eq!(a.feature("DrivAge").and_then(Feature::as_str), Some("18-20"));
    assert_eq!(a.feature("BonusMalus").and_then(Feature::as_f64), Some(150.0));
    assert_eq!(a.feature("Density").and_then(Feature::as_f64), Some(0.0));

    assert_eq!(b.feature("VehPower").and_then(Feature::as_str), Some("5"));
    assert_eq!(b.feature("VehAge").and_then(Feature::as_str), Some("11+"));
    assert_eq!(b.feature("DrivAge").and_then(Feature::as_str), Some("71+"));
    assert_eq!(b.feature("Density").and_then(Feature::as_f64), Some(100f64.ln()));
    assert_eq!(b.feature("Region"), Some(&Feature::Categorical("R11".into())));
}

#[test]
fn band_edges_are_inclusive() {
    assert_eq!(veh_age_band(1.0), "1-10");
    assert_eq!(veh_age_band(10.0), "1-10");
    assert_eq!(driv_age_band(25.0), "21-25");
    assert_eq!(driv_age_band(70.0), "51-70");
    assert_eq!(driv_age_band(70.5), "71+");
}

#[test]
fn missing_feature_is_invalid() {
    use crate::dataset::Caps;

    let data = Dataset::new(vec![Record::new(1, 0.5)], &Caps::default()).unwrap();
    match glm_features(&data) {
        Err(Error::InvalidArgument(msg)) => assert!(msg.contains("VehPower")),
        other => panic!("expected InvalidArgument, got {:?}", other),
    }
}
