mod error;
mod generator;
mod layout;
pub mod node_id;
mod random;
mod time;

pub use crate::error::*;
pub use crate::generator::*;
pub use crate::layout::*;
pub use crate::random::*;
pub use crate::time::*;
