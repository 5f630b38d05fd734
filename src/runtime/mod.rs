pub mod execution;
pub mod builder;
pub mod repository;
pub mod redis_repository;
