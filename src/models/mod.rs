pub mod cost;
pub mod forecast;
pub mod types;

pub use cost::*;
pub use forecast::*;
pub use types::*;
