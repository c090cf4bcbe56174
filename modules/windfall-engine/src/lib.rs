pub mod action;
pub mod campaign;
#[cfg(test)]
mod campaign_tests;
pub mod discovery;
pub mod ledger;
pub mod notify_gate;
pub mod pipeline;
pub mod state;
pub mod stats;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;
pub mod winner;
