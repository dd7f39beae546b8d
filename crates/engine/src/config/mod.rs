mod loader;
mod schema;

pub use loader::{apply_env_overrides, load_from_file, load_from_str, validate, LoadError};
pub use schema::{ApiConfig, EngineConfig, EvaluationConfig, NotifyConfig, QueryConfig};
