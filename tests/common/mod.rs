pub mod drives;
pub mod fixtures;
