//! The homogeneous Poisson model: one claim frequency for every policy.

use crate::dataset::{Dataset, CLAIM_COUNT_COLUMN, EXPOSURE_COLUMN};
use crate::error::{Error, Result};
use crate::service::{
    FitSpec, HyperparameterGrid, ModelKind, ModelingService, SearchBudget, SearchStrategy,
};

/// Intercept-only Poisson regression
///
/// With an exposure offset the maximum likelihood estimate of the frequency is
/// `sum(claims) / sum(exposure)` and the expected claim count of a policy is that frequency times
/// its exposure. Without an offset every policy is predicted the mean claim count.
/// ```
/// # use claimfreq::baseline::HomogeneousPoisson;
/// # use claimfreq::dataset::{Caps, Dataset, Record};
/// let data = Dataset::new(vec![Record::new(1, 0.5), Record::new(0, 1.0)], &Caps::default()).unwrap();
/// let model = HomogeneousPoisson::fit(&data, true).unwrap();
/// assert_eq!(model.frequency(), 1.0 / 1.5);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct HomogeneousPoisson {
    frequency: f64,
    uses_exposure: bool,
}

impl HomogeneousPoisson {
    pub fn fit(train: &Dataset, uses_exposure: bool) -> Result<Self> {
        let claims: f64 = train.claim_counts().iter().sum();
        let volume = if uses_exposure {
            train.exposures().iter().sum()
        } else {
            train.len() as f64
        };

        if !(volume > 0.0) {
            return Err(Error::training("training set has no exposure"));
        }
        if claims == 0.0 {
            return Err(Error::training(
                "training set has no claims; the log-link intercept is unbounded",
            ));
        }

        Ok(HomogeneousPoisson {
            frequency: claims / volume,
            uses_exposure,
        })
    }

    /// estimated claims per year of exposure, or per policy without an offset
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn predict(&self, data: &Dataset) -> Vec<f64> {
        if self.uses_exposure {
            data.exposures().iter().map(|e| self.frequency * e).collect()
        } else {
            vec![self.frequency; data.len()]
        }
    }
}

/// Modeling service that serves the homogeneous model in-process and refuses everything else
#[derive(Debug, Clone, Copy, Default)]
pub struct BaselineService;

impl BaselineService {
    pub fn new() -> Self {
        BaselineService
    }

    fn check(spec: &FitSpec) -> Result<bool> {
        if spec.model_kind != ModelKind::Homogeneous {
            return Err(Error::training(format!(
                "{} models are not available in the baseline service",
                spec.model_kind
            )));
        }
        if spec.target_column != CLAIM_COUNT_COLUMN {
            return Err(Error::training(format!(
                "unknown target column {}",
                spec.target_column
            )));
        }
        match spec.offset_column {
            None => Ok(false),
            Some(ref col) if col == EXPOSURE_COLUMN => Ok(true),
            Some(ref col) => Err(Error::training(format!("unknown offset column {}", col))),
        }
    }
}

impl ModelingService for BaselineService {
    type Handle = HomogeneousPoisson;

    fn fit(&self, train: &Dataset, spec: &FitSpec) -> Result<HomogeneousPoisson> {
        let uses_exposure = BaselineService::check(spec)?;
        if !spec.predictor_columns.is_empty() {
            debug!(
                "homogeneous model ignores {} predictor columns",
                spec.predictor_columns.len()
            );
        }

        let model = HomogeneousPoisson::fit(train, uses_exposure)?;
        info!(
            "Fitted homogeneous model on {} records: frequency {:.5}",
            train.len(),
            model.frequency()
        );
        Ok(model)
    }

    fn predict(&self, model: &HomogeneousPoisson, data: &Dataset) -> Result<Vec<f64>> {
        Ok(model.predict(data))
    }

    /// The homogeneous model has no hyperparameters, so the only searchable grid is the empty
    /// one, which yields a single model. A single fit never approaches a runtime limit.
    fn search(
        &self,
        train: &Dataset,
        base: &FitSpec,
        grid: &HyperparameterGrid,
        _strategy: SearchStrategy,
        budget: SearchBudget,
    ) -> Result<Vec<HomogeneousPoisson>> {
        if let Some(name) = grid.0.keys().next() {
            return Err(Error::training(format!(
                "homogeneous model has no hyperparameter {}",
                name
            )));
        }
        if budget.max_models == Some(0) {
            return Ok(Vec::new());
        }

        Ok(vec![self.fit(train, base)?])
    }
}

#[cfg(test)]
fn portfolio() -> Dataset {
    use crate::dataset::{Caps, Record};

    let records = vec![
        Record::new(0, 1.0),
        Record::new(1, 0.5),
        Record::new(0, 0.25),
        Record::new(2, 1.0),
        Record::new(0, 0.25),
    ];
    Dataset::new(records, &Caps::default()).unwrap()
}

#[test]
fn frequency_is_claims_per_exposure() {
    let model = HomogeneousPoisson::fit(&portfolio(), true).unwrap();
    assert_eq!(model.frequency(), 1.0);
    assert_eq!(model.predict(&portfolio()), vec![1.0, 0.5, 0.25, 1.0, 0.25]);

    let model = HomogeneousPoisson::fit(&portfolio(), false).unwrap();
    assert_eq!(model.frequency(), 0.6);
    assert_eq!(model.predict(&portfolio()), vec![0.6; 5]);
}

#[test]
fn no_claims_is_a_training_error() {
    use crate::dataset::{Caps, Record};

    let data = Dataset::new(vec![Record::new(0, 1.0)], &Caps::default()).unwrap();
    match HomogeneousPoisson::fit(&data, true) {
        Err(Error::TrainingError(_)) => {}
        other => panic!("expected TrainingError, got {:?}", other),
    }
}

#[test]
fn service_fits_only_homogeneous_models() {
    let service = BaselineService::new();
    let spec = FitSpec::new(CLAIM_COUNT_COLUMN, ModelKind::Homogeneous).offset(EXPOSURE_COLUMN);

    let model = service.fit(&portfolio(), &spec).unwrap();
    assert_eq!(service.predict(&model, &portfolio()).unwrap().len(), 5);

    for &kind in &[ModelKind::Glm, ModelKind::Gbm, ModelKind::DeepLearning] {
        let spec = FitSpec::new(CLAIM_COUNT_COLUMN, kind);
        match service.fit(&portfolio(), &spec) {
            Err(Error::TrainingError(_)) => {}
            other => panic!("{}: expected TrainingError, got {:?}", kind, other),
        }
    }

    let spec = FitSpec::new(CLAIM_COUNT_COLUMN, ModelKind::Homogeneous).offset("Duration");
    assert!(service.fit(&portfolio(), &spec).is_err());
}

#[test]
fn search_over_empty_grid() {
    let service = BaselineService::new();
    let spec = FitSpec::new(CLAIM_COUNT_COLUMN, ModelKind::Homogeneous).offset(EXPOSURE_COLUMN);

    let models = service
        .search(
            &portfolio(),
            &spec,
            &HyperparameterGrid::new(),
            SearchStrategy::Cartesian,
            SearchBudget::unlimited(),
        )
        .unwrap();
    assert_eq!(models.len(), 1);

    let grid = HyperparameterGrid::new().with("alpha", vec![json!(0.5)]);
    let result = service.search(
        &portfolio(),
        &spec,
        &grid,
        SearchStrategy::Cartesian,
        SearchBudget::unlimited(),
    );
    assert!(result.is_err());
}

#[test]
fn zero_exposure_fits_but_cannot_be_scored() {
    use crate::dataset::{Caps, Record};
    use crate::measure_accumulator::poisson_deviance;

    let records = vec![Record::new(1, 1.0), Record::new(0, 0.0), Record::new(2, 0.5)];
    let data = Dataset::new(records, &Caps::default()).unwrap();

    let service = BaselineService::new();
    let spec = FitSpec::new(CLAIM_COUNT_COLUMN, ModelKind::Homogeneous).offset(EXPOSURE_COLUMN);

    let models = service
        .search(
            &data,
            &spec,
            &HyperparameterGrid::new(),
            SearchStrategy::Cartesian,
            SearchBudget::unlimited(),
        )
        .unwrap();
    assert_eq!(models, vec![service.fit(&data, &spec).unwrap()]);

    let predictions = models[0].predict(&data);
    assert_eq!(predictions[1], 0.0);
    match poisson_deviance(&predictions, &data.claim_counts()) {
        Err(Error::InvalidArgument(_)) => {}
        other => panic!("expected InvalidArgument, got {:?}", other),
    }
}
