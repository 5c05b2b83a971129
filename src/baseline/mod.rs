//! Implementation of simple baseline models, used for testing and demonstration.

mod homogeneous;

pub use self::homogeneous::{BaselineService, HomogeneousPoisson};
