pub mod config;
pub mod detection;
pub mod hash;
pub mod ledger;
pub mod liability;
pub mod output;
pub mod store;
