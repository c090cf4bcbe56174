pub mod clock;
pub mod config;
pub mod error;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{AccountConfig, CampaignConfig, Config};
pub use error::WindfallError;
pub use types::*;
