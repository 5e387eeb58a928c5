mod catalog;
mod transaction;

pub use catalog::*;
pub use transaction::*;
