mod evaluator;
mod event;
mod fingerprint;
mod health;
mod rule;
mod rule_file;
mod state;
mod store;
mod table;
pub mod template;
pub mod test_harness;

pub use evaluator::{instance_labels, Evaluator, ReloadOutcome, ReloadSummary};
pub use event::{AlertEvent, AlertStatus};
pub use fingerprint::{fingerprint, fingerprint_string};
pub use health::{HealthChange, RuleHealth, RuleHealthStatus, DEFAULT_FAILURE_THRESHOLD};
pub use rule::{rule_id, Rule, Severity};
pub use rule_file::{load_rules, parse_rules, ParseError};
pub use state::{AlertInstance, AlertState};
pub use store::RuleStore;
pub use table::AlertStateTable;
pub use template::TemplateError;
