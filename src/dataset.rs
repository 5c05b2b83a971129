//! Policy-period records and the data set they form.

use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// Name of the claim count column in freMTPL2freq
pub const CLAIM_COUNT_COLUMN: &str = "ClaimNb";

/// Name of the exposure column in freMTPL2freq
pub const EXPOSURE_COLUMN: &str = "Exposure";

/// Value of a single risk feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Feature {
    Numeric(f64),
    Categorical(String),
}

impl Feature {
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Feature::Numeric(x) => Some(x),
            Feature::Categorical(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match *self {
            Feature::Numeric(_) => None,
            Feature::Categorical(ref s) => Some(s),
        }
    }
}

/// One policy-period observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub claim_count: u32,

    /// fraction of a year the policy was in force
    pub exposure: f64,

    pub features: BTreeMap<String, Feature>,
}

impl Record {
    pub fn new(claim_count: u32, exposure: f64) -> Self {
        Record {
            claim_count,
            exposure,
            features: BTreeMap::new(),
        }
    }

    pub fn with_feature<S: Into<String>>(mut self, name: S, value: Feature) -> Self {
        self.features.insert(name.into(), value);
        self
    }

    pub fn feature(&self, name: &str) -> Option<&Feature> {
        self.features.get(name)
    }
}

/// Upper bounds applied to every record when a data set is built
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Caps {
    pub claim_count: u32,
    pub exposure: f64,
}

impl Default for Caps {
    fn default() -> Self {
        Caps {
            claim_count: 4,
            exposure: 1.0,
        }
    }
}

impl Caps {
    pub fn validate(&self) -> Result<()> {
        if !(self.exposure > 0.0 && self.exposure <= 1.0) {
            return Err(Error::invalid(format!(
                "exposure cap must lie in (0, 1], got {}",
                self.exposure
            )));
        }
        Ok(())
    }
}

/// An ordered collection of records. Capping happens once, in the constructor; afterwards the
/// records are never modified.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    /// Build a data set, clamping claim counts and exposures to `caps`.
    pub fn new(records: Vec<Record>, caps: &Caps) -> Result<Self> {
        caps.validate()?;

        let mut n_capped = 0;
        let mut records = records;
        for (i, r) in records.iter_mut().enumerate() {
            if !r.exposure.is_finite() || r.exposure < 0.0 {
                return Err(Error::invalid(format!(
                    "record {} has invalid exposure {}",
                    i, r.exposure
                )));
            }
            if r.claim_count > caps.claim_count || r.exposure > caps.exposure {
                n_capped += 1;
            }
            r.claim_count = r.claim_count.min(caps.claim_count);
            r.exposure = r.exposure.min(caps.exposure);
        }

        debug!("{} of {} records capped", n_capped, records.len());
        Ok(Dataset { records })
    }

    /// Parse a freMTPL2freq ARFF file into a capped data set.
    pub fn from_arff(source: &str, caps: &Caps) -> Result<Self> {
        let rows: Vec<FreMtplRow> = arff::from_str(source)?;
        let records = rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| row.into_record(i))
            .collect::<Result<Vec<_>>>()?;
        info!("Parsed {} policy records", records.len());
        Dataset::new(records, caps)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// observed claim counts, in record order
    pub fn claim_counts(&self) -> Vec<f64> {
        self.records.iter().map(|r| f64::from(r.claim_count)).collect()
    }

    pub fn exposures(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.exposure).collect()
    }

    /// Copy the records at `indices` into a new data set, in the order given.
    pub fn select(&self, indices: &[usize]) -> Result<Dataset> {
        let records = indices
            .iter()
            .map(|&i| {
                self.records.get(i).cloned().ok_or_else(|| {
                    Error::invalid(format!("index {} out of range for {} records", i, self.len()))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Dataset { records })
    }

    /// Apply `f` to every record, producing a new data set.
    pub(crate) fn try_map<F>(&self, f: F) -> Result<Dataset>
    where
        F: Fn(&Record) -> Result<Record>,
    {
        let records = self.records.iter().map(f).collect::<Result<Vec<_>>>()?;
        Ok(Dataset { records })
    }
}

/// A row of the freMTPL2freq table as published on OpenML
#[derive(Debug, Deserialize)]
struct FreMtplRow {
    #[serde(rename = "IDpol")]
    _id: f64,
    #[serde(rename = "ClaimNb")]
    claim_nb: f64,
    #[serde(rename = "Exposure")]
    exposure: f64,
    #[serde(rename = "Area")]
    area: String,
    #[serde(rename = "VehPower")]
    veh_power: f64,
    #[serde(rename = "VehAge")]
    veh_age: f64,
    #[serde(rename = "DrivAge")]
    driv_age: f64,
    #[serde(rename = "BonusMalus")]
    bonus_malus: f64,
    #[serde(rename = "VehBrand")]
    veh_brand: String,
    #[serde(rename = "VehGas")]
    veh_gas: String,
    #[serde(rename = "Density")]
    density: f64,
    #[serde(rename = "Region")]
    region: String,
}

impl FreMtplRow {
    fn into_record(self, row: usize) -> Result<Record> {
        if !(self.claim_nb >= 0.0) {
            return Err(Error::invalid(format!(
                "row {} has negative claim count {}",
                row, self.claim_nb
            )));
        }

        // the published file quotes nominal levels, e.g. 'B12'
        let unquote = |s: String| s.trim_matches('\'').to_owned();

        Ok(Record::new(self.claim_nb.round() as u32, self.exposure)
            .with_feature("Area", Feature::Categorical(unquote(self.area)))
            .with_feature("VehPower", Feature::Numeric(self.veh_power))
            .with_feature("VehAge", Feature::Numeric(self.veh_age))
            .with_feature("DrivAge", Feature::Numeric(self.driv_age))
            .with_feature("BonusMalus", Feature::Numeric(self.bonus_malus))
            .with_feature("VehBrand", Feature::Categorical(unquote(self.veh_brand)))
            .with_feature("VehGas", Feature::Categorical(unquote(self.veh_gas)))
            .with_feature("Density", Feature::Numeric(self.density))
            .with_feature("Region", Feature::Categorical(unquote(self.region))))
    }
}

#[test]
fn caps_are_applied_at_load() {
    let records = vec![
        Record::new(0, 0.5),
        Record::new(7, 1.3),
        Record::new(4, 1.0),
    ];

    let data = Dataset::new(records, &Caps::default()).unwrap();

    assert_eq!(data.claim_counts(), vec![0.0, 4.0, 4.0]);
    assert_eq!(data.exposures(), vec![0.5, 1.0, 1.0]);
}

#[test]
fn negative_exposure_is_rejected() {
    let records = vec![Record::new(1, -0.1)];
    match Dataset::new(records, &Caps::default()) {
        Err(Error::InvalidArgument(_)) => {}
        other => panic!("expected InvalidArgument, got {:?}", other),
    }
}

#[test]
fn non_finite_exposure_is_rejected() {
    for &exposure in &[::std::f64::NAN, ::std::f64::INFINITY] {
        match Dataset::new(vec![Record::new(0, 0.5), Record::new(1, exposure)], &Caps::default()) {
            Err(Error::InvalidArgument(_)) => {}
            other => panic!("exposure {}: expected InvalidArgument, got {:?}", exposure, other),
        }
    }
}

#[test]
fn select_keeps_given_order() {
    let records = (0..5).map(|i| Record::new(i, 0.1 * f64::from(i))).collect();
    let data = Dataset::new(records, &Caps::default()).unwrap();

    let subset = data.select(&[3, 0, 1]).unwrap();
    assert_eq!(subset.claim_counts(), vec![3.0, 0.0, 1.0]);

    assert!(data.select(&[5]).is_err());
}

#[cfg(test)]
const FREMTPL_HEADER: &str = "@RELATION freMTPL2freq

@ATTRIBUTE IDpol NUMERIC
@ATTRIBUTE ClaimNb NUMERIC
@ATTRIBUTE Exposure NUMERIC
@ATTRIBUTE Area {A,B,C,D,E,F}
@ATTRIBUTE VehPower NUMERIC
@ATTRIBUTE VehAge NUMERIC
@ATTRIBUTE DrivAge NUMERIC
@ATTRIBUTE BonusMalus NUMERIC
@ATTRIBUTE VehBrand {B1,B12}
@ATTRIBUTE VehGas {Diesel,Regular}
@ATTRIBUTE Density NUMERIC
@ATTRIBUTE Region {R22,R82}

@DATA
";

#[test]
fn parse_fremtpl_arff() {
    let source = format!(
        "{}1,1,0.1,D,5,0,55,50,B12,Regular,1217,R82\n3,6,1.77,B,6,2,52,50,B12,Diesel,54,R22\n",
        FREMTPL_HEADER
    );

    let data = Dataset::from_arff(&source, &Caps::default()).unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data.claim_counts(), vec![1.0, 4.0]);
    assert_eq!(data.exposures(), vec![0.1, 1.0]);

    let first = &data.records()[0];
    assert_eq!(first.feature("Region"), Some(&Feature::Categorical("R82".into())));
    assert_eq!(first.feature("Density").and_then(Feature::as_f64), Some(1217.0));
}

#[test]
fn negative_claim_count_in_arff_is_rejected() {
    let source = format!(
        "{}1,1,0.1,D,5,0,55,50,B12,Regular,1217,R82\n2,-1,0.5,B,6,2,52,50,B1,Diesel,54,R22\n",
        FREMTPL_HEADER
    );

    match Dataset::from_arff(&source, &Caps::default()) {
        Err(Error::InvalidArgument(msg)) => assert!(msg.contains("row 1"), "{}", msg),
        other => panic!("expected InvalidArgument, got {:?}", other),
    }
}
