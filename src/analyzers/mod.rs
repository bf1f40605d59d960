pub mod agreement;
pub mod coverage;
