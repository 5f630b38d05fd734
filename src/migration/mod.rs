pub mod support;
pub mod matcher;
pub mod plan;
pub mod generator;
pub mod validation;
pub mod executor;
pub mod error;

pub use plan::{MigrationInstruction, MigrationPlan};
pub use error::MigrationError;
