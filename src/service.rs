//! The boundary to an external modeling service.
//!
//! Fitting GLMs, boosted trees and neural networks, and searching their hyperparameters, happens
//! behind this trait. The harness only hands over the training records and a `FitSpec` and gets
//! back opaque model handles whose predictions it scores itself.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde_json::Value;

use crate::dataset::Dataset;
use crate::error::{Error, Result};

/// Family of model the service is asked to fit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    /// intercept-only Poisson model
    Homogeneous,
    Glm,
    Gbm,
    DeepLearning,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match *self {
            ModelKind::Homogeneous => "homogeneous",
            ModelKind::Glm => "glm",
            ModelKind::Gbm => "gbm",
            ModelKind::DeepLearning => "deeplearning",
        };
        f.write_str(name)
    }
}

/// Hyperparameter values by name; interpretation is up to the service
pub type Hyperparameters = BTreeMap<String, Value>;

/// Candidate values per hyperparameter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HyperparameterGrid(pub BTreeMap<String, Vec<Value>>);

impl HyperparameterGrid {
    pub fn new() -> Self {
        HyperparameterGrid(BTreeMap::new())
    }

    pub fn with<S: Into<String>>(mut self, name: S, values: Vec<Value>) -> Self {
        self.0.insert(name.into(), values);
        self
    }

    /// Number of points in the full Cartesian grid.
    pub fn size(&self) -> Result<usize> {
        let mut size = 1usize;
        for (name, values) in &self.0 {
            if values.is_empty() {
                return Err(Error::invalid(format!(
                    "hyperparameter {} has no candidate values",
                    name
                )));
            }
            size = size.saturating_mul(values.len());
        }
        Ok(size)
    }

    /// Hyperparameter set at position `index` of the grid, enumerated with the last name varying
    /// fastest.
    pub fn point(&self, index: usize) -> Result<Hyperparameters> {
        let size = self.size()?;
        if index >= size {
            return Err(Error::invalid(format!(
                "grid point {} out of range for {} points",
                index, size
            )));
        }

        let mut rest = index;
        let mut point = Hyperparameters::new();
        for (name, values) in self.0.iter().rev() {
            point.insert(name.clone(), values[rest % values.len()].clone());
            rest /= values.len();
        }
        Ok(point)
    }
}

/// How the service explores a grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SearchStrategy {
    /// every point of the grid
    Cartesian,

    /// points sampled at random
    RandomDiscrete { seed: u64 },
}

/// Limits on a search; the search stops at whichever is hit first
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SearchBudget {
    pub max_models: Option<usize>,
    pub max_runtime: Option<Duration>,
}

impl SearchBudget {
    pub fn unlimited() -> Self {
        SearchBudget::default()
    }

    pub fn models(n: usize) -> Self {
        SearchBudget {
            max_models: Some(n),
            max_runtime: None,
        }
    }

    pub fn runtime(limit: Duration) -> Self {
        SearchBudget {
            max_models: None,
            max_runtime: Some(limit),
        }
    }
}

/// What to fit: columns, model family and its hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitSpec {
    pub target_column: String,

    /// exposure column entering the model as `ln(exposure)` offset
    pub offset_column: Option<String>,

    pub predictor_columns: Vec<String>,

    pub model_kind: ModelKind,

    #[serde(default)]
    pub hyperparameters: Hyperparameters,
}

impl FitSpec {
    pub fn new<S: Into<String>>(target_column: S, model_kind: ModelKind) -> Self {
        FitSpec {
            target_column: target_column.into(),
            offset_column: None,
            predictor_columns: Vec::new(),
            model_kind,
            hyperparameters: Hyperparameters::new(),
        }
    }

    pub fn offset<S: Into<String>>(mut self, column: S) -> Self {
        self.offset_column = Some(column.into());
        self
    }

    pub fn predictors<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.predictor_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn hyperparameter<S: Into<String>>(mut self, name: S, value: Value) -> Self {
        self.hyperparameters.insert(name.into(), value);
        self
    }
}

/// An external modeling service
///
/// Implementations report their own failures as `Error::TrainingError`.
pub trait ModelingService {
    /// Reference to a fitted model held by the service
    type Handle;

    fn fit(&self, train: &Dataset, spec: &FitSpec) -> Result<Self::Handle>;

    /// One non-negative prediction per record of `data`, in record order.
    fn predict(&self, model: &Self::Handle, data: &Dataset) -> Result<Vec<f64>>;

    /// Fit the grid points chosen by `strategy` within `budget`, starting from `base`. Models are
    /// returned best first by the service's own metric.
    fn search(
        &self,
        train: &Dataset,
        base: &FitSpec,
        grid: &HyperparameterGrid,
        strategy: SearchStrategy,
        budget: SearchBudget,
    ) -> Result<Vec<Self::Handle>>;
}

#[test]
fn grid_points_cover_the_grid() {
    let grid = HyperparameterGrid::new()
        .with("max_depth", vec![json!(3), json!(5), json!(7)])
        .with("learn_rate", vec![json!(0.05), json!(0.1)]);

    assert_eq!(grid.size().unwrap(), 6);

    let first = grid.point(0).unwrap();
    assert_eq!(first["learn_rate"], json!(0.05));
    assert_eq!(first["max_depth"], json!(3));

    let second = grid.point(1).unwrap();
    assert_eq!(second["learn_rate"], json!(0.05));
    assert_eq!(second["max_depth"], json!(5));

    let points: Vec<_> = (0..6).map(|i| grid.point(i).unwrap()).collect();
    for (i, a) in points.iter().enumerate() {
        for b in &points[i + 1..] {
            assert_ne!(a, b);
        }
    }

    assert!(grid.point(6).is_err());
}

#[test]
fn empty_candidate_list_is_invalid() {
    let grid = HyperparameterGrid::new().with("epochs", vec![]);
    match grid.size() {
        Err(Error::InvalidArgument(_)) => {}
        other => panic!("expected InvalidArgument, got {:?}", other),
    }
}

#[test]
fn fit_spec_from_json() {
    let spec: FitSpec = serde_json::from_value(json!({
        "target_column": "ClaimNb",
        "offset_column": "Exposure",
        "predictor_columns": ["VehPower", "Region"],
        "model_kind": "Glm"
    }))
    .unwrap();

    let expected = FitSpec::new("ClaimNb", ModelKind::Glm)
        .offset("Exposure")
        .predictors(vec!["VehPower", "Region"]);
    assert_eq!(spec, expected);
}
