pub mod database;
pub mod repository;
pub mod rpc;
pub mod worker_registry;
