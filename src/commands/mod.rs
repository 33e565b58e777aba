pub mod plan;
pub mod scan;
