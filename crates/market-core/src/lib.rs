pub mod bands;
pub mod error;
pub mod money;
pub mod timer;
pub mod types;

pub use bands::*;
pub use error::*;
pub use money::*;
pub use timer::*;
pub use types::*;
