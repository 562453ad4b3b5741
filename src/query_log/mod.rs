pub mod record;
pub mod store;
pub mod viewer;

pub use record::*;
pub use store::*;
pub use viewer::*;
