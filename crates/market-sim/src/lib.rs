pub mod earnings;
pub mod price_process;
pub mod recession;

pub use earnings::{EarningsConfig, EarningsReport, EarningsScheduler};
pub use price_process::{PriceMove, PriceProcess};
pub use recession::{RecessionConfig, RecessionEvent, RecessionScheduler, RecessionTier, SeverityTable};
