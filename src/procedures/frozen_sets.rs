use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{Error, Result};

use super::{Fold, Procedure};

/// Folds computed once and stored, so later sessions score against exactly the same records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrozenSets {
    pub folds: Vec<Vec<Fold>>,
}

impl FrozenSets {
    pub fn from_fold(fold: Fold) -> Self {
        FrozenSets {
            folds: vec![vec![fold]],
        }
    }

    /// Load folds previously written with `save`, checking that each partitions `n` records.
    pub fn load<P: AsRef<Path>>(path: P, n: usize) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let sets: FrozenSets = serde_json::from_reader(BufReader::new(file))?;

        for fold in sets.iter() {
            if !fold.is_partition_of(n) {
                return Err(Error::invalid(format!(
                    "stored fold in {} does not partition {} records",
                    path.as_ref().display(),
                    n
                )));
            }
        }

        info!("Loaded frozen folds from {}", path.as_ref().display());
        Ok(sets)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }
}

impl Procedure for FrozenSets {
    fn iter<'a>(&'a self) -> Box<dyn Iterator<Item = &'a Fold> + 'a> {
        let iter = self.folds.iter().flat_map(|inner| inner.iter());
        Box::new(iter)
    }
}

#[test]
fn saved_folds_load_unchanged() {
    use super::holdout::split;
    use std::env;

    let fold = split(50, 0.9, 11).unwrap();
    let sets = FrozenSets::from_fold(fold);

    let path = env::temp_dir().join(format!("claimfreq-frozen-{}.json", ::std::process::id()));
    sets.save(&path).unwrap();
    let loaded = FrozenSets::load(&path, 50).unwrap();
    let _ = ::std::fs::remove_file(&path);

    assert_eq!(loaded, sets);
}

#[test]
fn mismatched_size_is_rejected() {
    use super::holdout::split;
    use std::env;

    let sets = FrozenSets::from_fold(split(10, 0.5, 0).unwrap());

    let path = env::temp_dir().join(format!("claimfreq-mismatch-{}.json", ::std::process::id()));
    sets.save(&path).unwrap();
    let result = FrozenSets::load(&path, 11);
    let _ = ::std::fs::remove_file(&path);

    match result {
        Err(Error::InvalidArgument(_)) => {}
        other => panic!("expected InvalidArgument, got {:?}", other),
    }
}
