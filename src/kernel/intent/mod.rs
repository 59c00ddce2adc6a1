pub mod classifier;
pub mod types;

pub use classifier::{IntentClassifier, Predicate, Residual, Rule, RuleTable};
pub use types::{normalize_transcript, Intent, IntentKind};
