// Library root: the standings pipeline, the playoff bracket engine, and the
// SQLite persistence layer they read from and write to.

pub mod config;
pub mod db;
pub mod error;
pub mod import;
pub mod model;
pub mod playoffs;
pub mod standings;
pub mod store;

pub use error::ScenarioError;
pub use model::{GameFact, Pick, Scenario, Sport, Team};
