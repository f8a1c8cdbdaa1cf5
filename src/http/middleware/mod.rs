//! Tower middleware stages.

pub mod charset;

pub use charset::{CharsetLayer, CharsetService};
