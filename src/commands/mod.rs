pub mod count;
pub mod merge;
pub mod stats;
