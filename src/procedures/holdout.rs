use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::{Error, Result};

use super::{Fold, Procedure};

/// A single seeded train/test split.
///
/// The indices `0..n` are shuffled with a ChaCha8 generator seeded from `seed`; the first
/// `round(fraction * n)` of the permutation form the training set, the rest the test set. The
/// generator is portable, so the same `(n, fraction, seed)` yields the same fold everywhere.
#[derive(Debug, Clone)]
pub struct Holdout {
    fold: Fold,
    seed: u64,
}

impl Holdout {
    pub fn new(n: usize, fraction: f64, seed: u64) -> Result<Self> {
        let fold = split(n, fraction, seed)?;
        Ok(Holdout { fold, seed })
    }

    pub fn fold(&self) -> &Fold {
        &self.fold
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn into_fold(self) -> Fold {
        self.fold
    }
}

impl Procedure for Holdout {
    fn iter<'a>(&'a self) -> Box<dyn Iterator<Item = &'a Fold> + 'a> {
        Box::new(::std::iter::once(&self.fold))
    }
}

/// Partition `0..n` into a training and a test set.
pub fn split(n: usize, fraction: f64, seed: u64) -> Result<Fold> {
    if !(fraction > 0.0 && fraction < 1.0) {
        return Err(Error::invalid(format!(
            "split fraction must lie in (0, 1), got {}",
            fraction
        )));
    }
    if n == 0 {
        return Err(Error::invalid("cannot split an empty data set"));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_train = (fraction * n as f64).round() as usize;
    let testset = indices.split_off(n_train);

    debug!(
        "holdout split of {} records (seed {}): {} train, {} test",
        n,
        seed,
        indices.len(),
        testset.len()
    );

    Ok(Fold {
        trainset: indices,
        testset,
    })
}

#[test]
fn same_seed_same_split() {
    let a = split(1000, 0.9, 42).unwrap();
    let b = split(1000, 0.9, 42).unwrap();
    assert_eq!(a, b);

    let c = split(1000, 0.9, 43).unwrap();
    assert_ne!(a, c);
}

#[test]
fn ten_records_nine_to_one() {
    let fold = split(10, 0.9, 7).unwrap();
    assert_eq!(fold.trainset.len(), 9);
    assert_eq!(fold.testset.len(), 1);
    assert!(fold.is_partition_of(10));

    assert_eq!(split(10, 0.9, 7).unwrap(), fold);
}

#[test]
fn partition_is_complete() {
    for &(n, fraction) in &[(1, 0.5), (3, 0.5), (17, 0.25), (100, 0.9), (101, 0.9)] {
        let fold = split(n, fraction, 2018).unwrap();
        assert!(fold.is_partition_of(n));
        assert_eq!(fold.trainset.len(), (fraction * n as f64).round() as usize);
    }
}

#[test]
fn split_is_shuffled() {
    let fold = split(100, 0.5, 1).unwrap();
    let sorted: Vec<usize> = (0..50).collect();
    assert_ne!(fold.trainset, sorted);
}

#[test]
fn invalid_arguments() {
    for &fraction in &[0.0, 1.0, -0.5, 1.5, ::std::f64::NAN] {
        match split(10, fraction, 0) {
            Err(Error::InvalidArgument(_)) => {}
            other => panic!("fraction {}: expected InvalidArgument, got {:?}", fraction, other),
        }
    }

    match split(0, 0.9, 0) {
        Err(Error::InvalidArgument(_)) => {}
        other => panic!("expected InvalidArgument, got {:?}", other),
    }
}

#[test]
fn holdout_yields_one_fold() {
    let holdout = Holdout::new(20, 0.9, 5).unwrap();
    let folds: Vec<_> = holdout.iter().collect();
    assert_eq!(folds.len(), 1);
    assert_eq!(folds[0], &split(20, 0.9, 5).unwrap());
    assert_eq!(holdout.seed(), 5);
}
