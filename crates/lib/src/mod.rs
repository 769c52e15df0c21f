pub mod classify;
pub mod config;
pub mod constant;
pub mod error;
pub mod fee;
pub mod log;
pub mod runner;
pub mod sanitize;
pub mod scenarios;
pub mod service;
pub mod types;
pub use classify::Classification;
pub use config::Config;
pub use error::SuiteError;
pub use runner::{ScenarioRunner, SuiteEnvironment, SuiteResult};
pub use service::{NodeClient, SimulatedLedger, TransactionService};

#[cfg(test)]
pub mod tests;
