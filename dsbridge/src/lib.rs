pub mod dataset;
pub mod driver;
pub mod markup;
pub mod model;
pub mod reporting;
pub mod source;

pub use driver::{Driver, Status};
