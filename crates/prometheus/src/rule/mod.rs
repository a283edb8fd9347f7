mod client;
mod model;
mod secure;
mod validate;

pub use client::AlertClient;
pub use model::{BulkUpdateResults, PromDuration, Rule, RuleFile, RuleGroup, RuleJsonWrapper};
pub use secure::secure_rule;
pub use validate::validate_rule;
