use crate::config::ExperimentConfig;
use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::measure_accumulator::{MeasureAccumulator, PoissonDeviance};
use crate::procedures::{Fold, Holdout, Procedure};
use crate::service::{FitSpec, HyperparameterGrid, ModelingService, SearchBudget, SearchStrategy};

use super::leaderboard::{Evaluation, Leaderboard};

/// Claim frequency task: a data set together with the folds every candidate model is scored on
pub struct FrequencyTask {
    name: String,
    dataset: Dataset,
    procedure: Box<dyn Procedure>,
}

impl FrequencyTask {
    pub fn new<S: Into<String>>(name: S, dataset: Dataset, procedure: Box<dyn Procedure>) -> Self {
        FrequencyTask {
            name: name.into(),
            dataset,
            procedure,
        }
    }

    /// Task with a single seeded holdout split of `dataset`.
    pub fn holdout<S: Into<String>>(
        name: S,
        dataset: Dataset,
        fraction: f64,
        seed: u64,
    ) -> Result<Self> {
        let holdout = Holdout::new(dataset.len(), fraction, seed)?;
        Ok(FrequencyTask::new(name, dataset, Box::new(holdout)))
    }

    pub fn from_config<S: Into<String>>(
        name: S,
        dataset: Dataset,
        config: &ExperimentConfig,
    ) -> Result<Self> {
        config.validate()?;
        FrequencyTask::holdout(name, dataset, config.train_fraction, config.seed)
    }

    /// get task name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Run the task with a caller-supplied flow. For every fold the flow receives the training
    /// records and the test records and must return one prediction per test record. The measure
    /// is accumulated over the test records of all folds.
    pub fn run<F, M>(&self, flow: F) -> Result<M>
    where
        F: Fn(&Dataset, &Dataset) -> Result<Vec<f64>>,
        M: MeasureAccumulator<f64>,
    {
        let mut measure = M::new();

        for fold in self.procedure.iter() {
            let (train, test) = self.materialize(fold)?;
            let predicted = flow(&train, &test)?;
            check_len(&predicted, &test)?;
            measure.update(&test.claim_counts(), &predicted)?;
        }

        Ok(measure)
    }

    /// Fit `spec` with `service` on each training set and score train and test deviance.
    pub fn evaluate<S, L>(&self, service: &S, label: L, spec: &FitSpec) -> Result<Evaluation>
    where
        S: ModelingService,
        L: Into<String>,
    {
        let label = label.into();
        let mut train_measure = PoissonDeviance::<f64>::new();
        let mut test_measure = PoissonDeviance::<f64>::new();

        for fold in self.procedure.iter() {
            let (train, test) = self.materialize(fold)?;
            let model = service.fit(&train, spec)?;
            accumulate(&mut train_measure, service, &model, &train)?;
            accumulate(&mut test_measure, service, &model, &test)?;
        }

        let evaluation = Evaluation {
            label,
            model_kind: spec.model_kind,
            train_deviance: train_measure.result()?,
            test_deviance: test_measure.result()?,
        };
        info!(
            "{}: {} train deviance {:.6}, test deviance {:.6}",
            self.name, evaluation.label, evaluation.train_deviance, evaluation.test_deviance
        );
        Ok(evaluation)
    }

    /// Evaluate every labelled candidate on the same folds.
    pub fn compare<S, L>(&self, service: &S, candidates: &[(L, FitSpec)]) -> Result<Leaderboard>
    where
        S: ModelingService,
        L: AsRef<str>,
    {
        let mut board = Leaderboard::new();
        for (label, spec) in candidates {
            let label: &str = label.as_ref();
            board.push(self.evaluate(service, label, spec)?);
        }
        Ok(board)
    }

    /// Run a hyperparameter search on each training set and re-score every returned model with
    /// the Poisson deviance. The service ranks by its own metric; the leaderboard ranks by test
    /// deviance.
    pub fn rescore_search<S>(
        &self,
        service: &S,
        base: &FitSpec,
        grid: &HyperparameterGrid,
        strategy: SearchStrategy,
        budget: SearchBudget,
    ) -> Result<Leaderboard>
    where
        S: ModelingService,
    {
        let mut board = Leaderboard::new();

        for (f, fold) in self.procedure.iter().enumerate() {
            let (train, test) = self.materialize(fold)?;
            let models = service.search(&train, base, grid, strategy, budget)?;
            debug!("search on fold {} returned {} models", f, models.len());

            for (rank, model) in models.iter().enumerate() {
                let mut train_measure = PoissonDeviance::<f64>::new();
                let mut test_measure = PoissonDeviance::<f64>::new();
                accumulate(&mut train_measure, service, model, &train)?;
                accumulate(&mut test_measure, service, model, &test)?;

                board.push(Evaluation {
                    label: format!("{} fold {} #{}", base.model_kind, f, rank + 1),
                    model_kind: base.model_kind,
                    train_deviance: train_measure.result()?,
                    test_deviance: test_measure.result()?,
                });
            }
        }

        Ok(board)
    }

    fn materialize(&self, fold: &Fold) -> Result<(Dataset, Dataset)> {
        Ok((
            self.dataset.select(&fold.trainset)?,
            self.dataset.select(&fold.testset)?,
        ))
    }
}

fn accumulate<S: ModelingService>(
    measure: &mut PoissonDeviance<f64>,
    service: &S,
    model: &S::Handle,
    data: &Dataset,
) -> Result<()> {
    let predicted = service.predict(model, data)?;
    check_len(&predicted, data)?;
    measure.update(&data.claim_counts(), &predicted)
}

fn check_len(predicted: &[f64], data: &Dataset) -> Result<()> {
    if predicted.len() != data.len() {
        return Err(Error::ShapeMismatch {
            expected: data.len(),
            actual: predicted.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::time::Duration;

    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use serde_json::Value;

    use super::*;
    use crate::baseline::{BaselineService, HomogeneousPoisson};
    use crate::dataset::{Caps, Record, CLAIM_COUNT_COLUMN, EXPOSURE_COLUMN};
    use crate::measure_accumulator::poisson_deviance;
    use crate::service::ModelKind;

    fn portfolio(n: usize) -> Dataset {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let records = (0..n)
            .map(|_| {
                let exposure = rng.gen_range(0.05..1.2);
                let claims = if rng.gen_bool(0.3) { rng.gen_range(1..6) } else { 0 };
                Record::new(claims, exposure)
            })
            .collect();
        Dataset::new(records, &Caps::default()).unwrap()
    }

    fn homogeneous() -> FitSpec {
        FitSpec::new(CLAIM_COUNT_COLUMN, ModelKind::Homogeneous).offset(EXPOSURE_COLUMN)
    }

    /// Scales the homogeneous frequency by the `scale` hyperparameter; searches return the grid
    /// in Cartesian order.
    struct ScaledService;

    impl ModelingService for ScaledService {
        type Handle = (HomogeneousPoisson, f64);

        fn fit(&self, train: &Dataset, spec: &FitSpec) -> Result<Self::Handle> {
            let scale = spec
                .hyperparameters
                .get("scale")
                .and_then(Value::as_f64)
                .unwrap_or(1.0);
            let base = FitSpec {
                model_kind: ModelKind::Homogeneous,
                hyperparameters: Default::default(),
                ..spec.clone()
            };
            Ok((BaselineService.fit(train, &base)?, scale))
        }

        fn predict(&self, model: &Self::Handle, data: &Dataset) -> Result<Vec<f64>> {
            Ok(model.0.predict(data).into_iter().map(|p| p * model.1).collect())
        }

        fn search(
            &self,
            train: &Dataset,
            base: &FitSpec,
            grid: &HyperparameterGrid,
            _strategy: SearchStrategy,
            budget: SearchBudget,
        ) -> Result<Vec<Self::Handle>> {
            let n = grid.size()?.min(budget.max_models.unwrap_or(usize::max_value()));
            (0..n)
                .map(|i| {
                    let mut spec = base.clone();
                    spec.hyperparameters = grid.point(i)?;
                    self.fit(train, &spec)
                })
                .collect()
        }
    }

    #[test]
    fn run_with_flow() {
        let task = FrequencyTask::holdout("synthetic", portfolio(200), 0.9, 3).unwrap();

        let result: PoissonDeviance<f64> = task
            .run(|train, test| {
                let model = HomogeneousPoisson::fit(train, true)?;
                Ok(model.predict(test))
            })
            .unwrap();

        let fold = crate::procedures::split(200, 0.9, 3).unwrap();
        let train = task.dataset().select(&fold.trainset).unwrap();
        let test = task.dataset().select(&fold.testset).unwrap();
        let expected = poisson_deviance(
            &HomogeneousPoisson::fit(&train, true).unwrap().predict(&test),
            &test.claim_counts(),
        )
        .unwrap();

        assert_eq!(result.count(), 20);
        assert_eq!(result.result().unwrap(), expected);
    }

    #[test]
    fn flow_must_predict_every_test_record() {
        let task = FrequencyTask::holdout("synthetic", portfolio(50), 0.9, 3).unwrap();
        let result: Result<PoissonDeviance<f64>> = task.run(|_, _| Ok(vec![1.0]));
        match result {
            Err(Error::ShapeMismatch { expected: 5, actual: 1 }) => {}
            other => panic!("expected ShapeMismatch, got {:?}", other.map(|m| m.count())),
        }
    }

    #[test]
    fn evaluate_reports_both_deviances() {
        let task = FrequencyTask::holdout("synthetic", portfolio(300), 0.9, 8).unwrap();
        let eval = task.evaluate(&BaselineService, "homogeneous", &homogeneous()).unwrap();

        assert_eq!(eval.label, "homogeneous");
        assert_eq!(eval.model_kind, ModelKind::Homogeneous);
        assert!(eval.train_deviance > 0.0);
        assert!(eval.test_deviance > 0.0);
    }

    #[test]
    fn same_seed_same_scores() {
        let a = FrequencyTask::holdout("a", portfolio(300), 0.9, 8).unwrap();
        let b = FrequencyTask::holdout("b", portfolio(300), 0.9, 8).unwrap();

        let ea = a.evaluate(&BaselineService, "h", &homogeneous()).unwrap();
        let eb = b.evaluate(&BaselineService, "h", &homogeneous()).unwrap();
        assert_eq!(ea, eb);
    }

    #[test]
    fn training_errors_pass_through() {
        let task = FrequencyTask::holdout("synthetic", portfolio(100), 0.9, 1).unwrap();
        let candidates = vec![
            ("homogeneous", homogeneous()),
            ("glm", FitSpec::new(CLAIM_COUNT_COLUMN, ModelKind::Glm)),
        ];
        match task.compare(&BaselineService, &candidates) {
            Err(Error::TrainingError(_)) => {}
            other => panic!("expected TrainingError, got {:?}", other),
        }
    }

    #[test]
    fn compare_ranks_by_test_deviance() {
        let task = FrequencyTask::holdout("synthetic", portfolio(400), 0.9, 5).unwrap();
        let candidates = vec![
            ("overshoot", homogeneous().hyperparameter("scale", json!(4.0))),
            ("mle", homogeneous()),
            ("undershoot", homogeneous().hyperparameter("scale", json!(0.2))),
        ];

        let board = task.compare(&ScaledService, &candidates).unwrap();
        assert_eq!(board.len(), 3);
        let scores: Vec<f64> = board.entries().iter().map(|e| e.test_deviance).collect();
        assert!(scores.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn search_results_are_rescored() {
        let task = FrequencyTask::holdout("synthetic", portfolio(400), 0.9, 5).unwrap();
        let grid = HyperparameterGrid::new().with("scale", vec![json!(3.0), json!(1.0), json!(0.5)]);

        let board = task
            .rescore_search(
                &ScaledService,
                &homogeneous(),
                &grid,
                SearchStrategy::Cartesian,
                SearchBudget::unlimited(),
            )
            .unwrap();
        assert_eq!(board.len(), 3);

        // the unscaled model is the maximum likelihood fit, so it has the lowest training deviance
        let mle = board
            .entries()
            .iter()
            .find(|e| e.label.ends_with("#2"))
            .unwrap();
        for e in board.entries() {
            assert!(mle.train_deviance <= e.train_deviance);
        }

        let limited = task
            .rescore_search(
                &ScaledService,
                &homogeneous(),
                &grid,
                SearchStrategy::RandomDiscrete { seed: 1 },
                SearchBudget::models(2),
            )
            .unwrap();
        assert_eq!(limited.len(), 2);
    }

    /// Remembers the strategy and budget of every search it is asked to run
    #[derive(Default)]
    struct RecordingService {
        searches: RefCell<Vec<(SearchStrategy, SearchBudget)>>,
    }

    impl ModelingService for RecordingService {
        type Handle = (HomogeneousPoisson, f64);

        fn fit(&self, train: &Dataset, spec: &FitSpec) -> Result<Self::Handle> {
            ScaledService.fit(train, spec)
        }

        fn predict(&self, model: &Self::Handle, data: &Dataset) -> Result<Vec<f64>> {
            ScaledService.predict(model, data)
        }

        fn search(
            &self,
            train: &Dataset,
            base: &FitSpec,
            grid: &HyperparameterGrid,
            strategy: SearchStrategy,
            budget: SearchBudget,
        ) -> Result<Vec<Self::Handle>> {
            self.searches.borrow_mut().push((strategy, budget));
            ScaledService.search(train, base, grid, strategy, budget)
        }
    }

    #[test]
    fn search_budget_reaches_the_service() {
        let task = FrequencyTask::holdout("synthetic", portfolio(100), 0.9, 8).unwrap();
        let grid = HyperparameterGrid::new().with("scale", vec![json!(1.0), json!(2.0)]);
        let budget = SearchBudget::runtime(Duration::from_secs(30));
        let strategy = SearchStrategy::RandomDiscrete { seed: 4 };

        let service = RecordingService::default();
        let board = task
            .rescore_search(&service, &homogeneous(), &grid, strategy, budget)
            .unwrap();

        assert_eq!(board.len(), 2);
        assert_eq!(*service.searches.borrow(), vec![(strategy, budget)]);
        assert_eq!(budget.max_runtime, Some(Duration::from_secs(30)));
        assert_eq!(budget.max_models, None);
    }
}
