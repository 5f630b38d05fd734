pub mod definition;
pub mod migration;
pub mod runtime;
pub mod service;
