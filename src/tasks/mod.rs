mod frequency;
mod leaderboard;

pub use self::frequency::FrequencyTask;
pub use self::leaderboard::{Evaluation, Leaderboard};
