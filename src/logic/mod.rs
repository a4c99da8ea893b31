pub mod patch;
pub mod reconcile;
pub mod validate;

pub use patch::*;
pub use reconcile::*;
pub use validate::*;
