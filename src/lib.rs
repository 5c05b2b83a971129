//! Reproducible evaluation of claim-frequency models.
//!
//! Policy records are split once per seed into a training and a test set; candidate models are
//! fitted by an external [`ModelingService`](service/trait.ModelingService.html) and compared by
//! their out-of-sample Poisson deviance.
//!
//! ```
//! # use claimfreq::prelude::*;
//! # use claimfreq::dataset::{Caps, Dataset, Record};
//! let records = (0..100u32)
//!     .map(|i| Record::new(i % 3 / 2, 0.5 + f64::from(i % 5) / 10.0))
//!     .collect();
//! let data = Dataset::new(records, &Caps::default()).unwrap();
//!
//! let task = FrequencyTask::holdout("portfolio", data, 0.9, 42).unwrap();
//! let spec = FitSpec::new("ClaimNb", ModelKind::Homogeneous).offset("Exposure");
//! let eval = task.evaluate(&BaselineService, "homogeneous", &spec).unwrap();
//! assert!(eval.test_deviance > 0.0);
//! ```

extern crate app_dirs;
extern crate arff;
extern crate fs2;
extern crate futures;
extern crate hyper;
extern crate hyper_tls;
#[macro_use]
extern crate log;
extern crate num_traits;
extern crate rand;
extern crate rand_chacha;
extern crate serde;
#[macro_use]
extern crate serde_derive;
#[cfg_attr(test, macro_use)]
extern crate serde_json;
extern crate tokio_core;

pub mod baseline;
pub mod config;
pub mod dataset;
mod error;
mod measure_accumulator;
pub mod openml_api;
pub mod preprocessing;
pub mod procedures;
pub mod service;
mod tasks;

pub use crate::error::{Error, Result};
pub use crate::measure_accumulator::{poisson_deviance, MeasureAccumulator, PoissonDeviance};
pub use crate::tasks::{Evaluation, FrequencyTask, Leaderboard};

pub mod prelude {
    pub use crate::baseline::BaselineService;
    pub use crate::measure_accumulator::MeasureAccumulator;
    pub use crate::service::{FitSpec, ModelKind, ModelingService};
    pub use crate::tasks::FrequencyTask;
}
