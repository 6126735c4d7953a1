pub mod matchup;
pub mod prediction;

pub use matchup::*;
pub use prediction::*;
