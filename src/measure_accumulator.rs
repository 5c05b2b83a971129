//! Measure accumulators are summaries of model performance. Claim-frequency models are compared
//! by their Poisson deviance.

use std::marker::PhantomData;

use num_traits::AsPrimitive;

use crate::error::{Error, Result};

/// Trait implemented by performance measures
pub trait MeasureAccumulator<T> {
    /// initialize new measure
    fn new() -> Self;

    /// update with one prediction
    fn update_one(&mut self, known: &T, pred: &T) -> Result<()>;

    /// number of predictions seen so far
    fn count(&self) -> usize;

    /// get resulting performance
    fn result(&self) -> Result<f64>;

    /// update with multiple predictions, paired by position
    fn update(&mut self, known: &[T], predicted: &[T]) -> Result<()> {
        if known.len() != predicted.len() {
            return Err(Error::ShapeMismatch {
                expected: known.len(),
                actual: predicted.len(),
            });
        }
        for (k, p) in known.iter().zip(predicted) {
            self.update_one(k, p)?;
        }
        Ok(())
    }
}

/// Mean Poisson unit deviance
///
/// `D = 2/n * sum(pred - known + known * ln(known / pred))`, where the logarithmic term is zero
/// for `known == 0`. Lower is better; a perfect fit has `D == 0`.
#[derive(Debug, Clone)]
pub struct PoissonDeviance<T> {
    sum: f64,
    n: usize,
    _t: PhantomData<T>,
}

impl<T> MeasureAccumulator<T> for PoissonDeviance<T>
where
    T: AsPrimitive<f64>,
{
    fn new() -> Self {
        PoissonDeviance {
            sum: 0.0,
            n: 0,
            _t: PhantomData,
        }
    }

    fn update_one(&mut self, known: &T, pred: &T) -> Result<()> {
        let y = known.as_();
        let mu = pred.as_();

        if !(mu > 0.0) || !mu.is_finite() {
            return Err(Error::invalid(format!(
                "predictions must be positive and finite, got {}",
                mu
            )));
        }
        if !(y >= 0.0) || !y.is_finite() {
            return Err(Error::invalid(format!(
                "observed counts must be non-negative and finite, got {}",
                y
            )));
        }

        // 0 * ln(0 / mu) -> 0
        let log_term = if y == 0.0 { 0.0 } else { y * (y / mu).ln() };

        self.sum += mu - y + log_term;
        self.n += 1;
        Ok(())
    }

    fn count(&self) -> usize {
        self.n
    }

    fn result(&self) -> Result<f64> {
        if self.n == 0 {
            return Err(Error::invalid("deviance of an empty prediction set"));
        }
        Ok(2.0 * self.sum / self.n as f64)
    }
}

/// Mean Poisson deviance of `predicted` against `observed`.
///
/// Predictions come first here, whereas `MeasureAccumulator::update` takes the observed values
/// first.
///
/// Fails with `ShapeMismatch` if the lengths differ, and with `InvalidArgument` for empty input,
/// non-positive predictions or negative observations.
pub fn poisson_deviance<P, Y>(predicted: &[P], observed: &[Y]) -> Result<f64>
where
    P: AsPrimitive<f64>,
    Y: AsPrimitive<f64>,
{
    if predicted.len() != observed.len() {
        return Err(Error::ShapeMismatch {
            expected: predicted.len(),
            actual: observed.len(),
        });
    }

    let mut measure = PoissonDeviance::<f64>::new();
    for (y, mu) in observed.iter().zip(predicted) {
        measure.update_one(&y.as_(), &mu.as_())?;
    }
    measure.result()
}

#[cfg(test)]
fn assert_close(a: f64, b: f64) {
    assert!((a - b).abs() < 1e-12, "{} != {}", a, b);
}

#[test]
fn zero_observation_drops_log_term() {
    assert_close(poisson_deviance(&[2.0], &[0.0]).unwrap(), 4.0);
}

#[test]
fn known_value() {
    // 2/2 * [(1 - 2 + 2 ln 2) + (0.5 - 0 + 0)]
    let expected = 1.0 - 2.0 + 2.0 * 2f64.ln() + 0.5;
    assert_close(poisson_deviance(&[1.0, 0.5], &[2u32, 0]).unwrap(), expected);
}

#[test]
fn perfect_fit_is_zero() {
    let y = [1.0, 2.0, 3.0, 0.5];
    assert_eq!(poisson_deviance(&y, &y).unwrap(), 0.0);
}

#[test]
fn near_miss_is_not_a_perfect_fit() {
    let obs = [0u32, 1, 2, 3];

    let above: Vec<f64> = obs.iter().map(|&y| f64::from(y) + 1e-6).collect();
    assert!(poisson_deviance(&above, &obs).unwrap() > 0.0);

    let mut one_off: Vec<f64> = obs.iter().map(|&y| f64::from(y)).collect();
    one_off[0] = 1e-3;
    one_off[2] = 2.0 - 1e-3;
    assert!(poisson_deviance(&one_off, &obs).unwrap() > 0.0);
}

#[test]
fn deviance_is_non_negative() {
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    let mut rng = ChaCha8Rng::seed_from_u64(3);
    for _ in 0..100 {
        let n = rng.gen_range(1..50);
        let pred: Vec<f64> = (0..n).map(|_| rng.gen_range(0.01..3.0)).collect();
        let obs: Vec<u32> = (0..n).map(|_| rng.gen_range(0..4)).collect();
        let d = poisson_deviance(&pred, &obs).unwrap();
        assert!(d > 0.0, "deviance {} for {:?} / {:?}", d, pred, obs);
    }
}

#[test]
fn doubling_predictions_shifts_deviance() {
    let pred = [0.1, 0.3, 1.2, 2.0];
    let obs = [0.0, 1.0, 1.0, 3.0];
    let doubled: Vec<f64> = pred.iter().map(|p| 2.0 * p).collect();

    let d1 = poisson_deviance(&pred, &obs).unwrap();
    let d2 = poisson_deviance(&doubled, &obs).unwrap();

    let n = pred.len() as f64;
    let shift: f64 = pred
        .iter()
        .zip(&obs)
        .map(|(p, y)| p - y * 2f64.ln())
        .sum::<f64>()
        * 2.0
        / n;

    assert!(d1 != d2);
    assert_close(d2 - d1, shift);
}

#[test]
fn length_mismatch() {
    match poisson_deviance(&[1.0, 2.0, 3.0], &[1.0, 2.0]) {
        Err(Error::ShapeMismatch {
            expected: 3,
            actual: 2,
        }) => {}
        other => panic!("expected ShapeMismatch, got {:?}", other),
    }
}

#[test]
fn invalid_values() {
    let cases: Vec<(Vec<f64>, Vec<f64>)> = vec![
        (vec![0.0], vec![1.0]),
        (vec![-1.0], vec![1.0]),
        (vec![::std::f64::NAN], vec![1.0]),
        (vec![1.0], vec![-1.0]),
        (vec![], vec![]),
    ];
    for (pred, obs) in cases {
        match poisson_deviance(&pred, &obs) {
            Err(Error::InvalidArgument(_)) => {}
            other => panic!("{:?} / {:?}: expected InvalidArgument, got {:?}", pred, obs, other),
        }
    }
}

#[test]
fn accumulator_matches_function() {
    let pred = [0.2, 0.4, 0.9];
    let obs = [0.0, 1.0, 2.0];

    let mut measure = PoissonDeviance::<f64>::new();
    measure.update(&obs, &pred).unwrap();

    assert_eq!(measure.count(), 3);
    assert_close(measure.result().unwrap(), poisson_deviance(&pred, &obs).unwrap());
}

#[test]
fn concurrent_scoring() {
    use std::thread;

    let obs = vec![0.0, 1.0, 0.0, 2.0];
    let candidates = vec![vec![0.5; 4], vec![0.1, 0.9, 0.1, 1.9], vec![1.0; 4]];

    let handles: Vec<_> = candidates
        .iter()
        .cloned()
        .map(|pred| {
            let obs = obs.clone();
            thread::spawn(move || poisson_deviance(&pred, &obs).unwrap())
        })
        .collect();

    for (h, pred) in handles.into_iter().zip(&candidates) {
        assert_eq!(h.join().unwrap(), poisson_deviance(pred, &obs).unwrap());
    }
}
