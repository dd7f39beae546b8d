pub mod alert;
pub mod api;
pub mod cli;
pub mod config;
pub mod metrics;
pub mod notifier;
pub mod query;
pub mod run;
pub mod scheduler;
pub mod shutdown;
