pub mod classifier;
pub mod lead;
pub mod lifecycle;
