//! Validation procedures

mod frozen_sets;
mod holdout;

pub use self::frozen_sets::FrozenSets;
pub use self::holdout::{split, Holdout};

/// Validation procedures support iteration over train/test folds
pub trait Procedure {
    fn iter<'a>(&'a self) -> Box<dyn Iterator<Item = &'a Fold> + 'a>;
}

/// A single fold, consisting of a training set and a testing set of record indices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fold {
    pub trainset: Vec<usize>,
    pub testset: Vec<usize>,
}

impl Fold {
    /// True if train and test are disjoint and together cover `0..n` exactly once.
    pub fn is_partition_of(&self, n: usize) -> bool {
        let mut seen = vec![false; n];
        for &i in self.trainset.iter().chain(self.testset.iter()) {
            match seen.get_mut(i) {
                Some(s) if !*s => *s = true,
                _ => return false,
            }
        }
        seen.into_iter().all(|s| s)
    }
}

#[test]
fn partition_check() {
    let fold = Fold {
        trainset: vec![2, 0],
        testset: vec![1],
    };
    assert!(fold.is_partition_of(3));
    assert!(!fold.is_partition_of(4));

    let overlapping = Fold {
        trainset: vec![0, 1],
        testset: vec![1, 2],
    };
    assert!(!overlapping.is_partition_of(3));
}
