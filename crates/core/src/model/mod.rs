mod collection;
mod ids;
mod review;
mod stats;

pub use collection::{CollectionError, ReviewCollection};
pub use ids::{ItemId, ItemIdError};
pub use review::{Difficulty, DifficultyError, ReviewItem};
pub use stats::ReviewStats;
