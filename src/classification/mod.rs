pub mod doctor_name;
pub mod phone;
pub mod pipeline;
pub mod remote;
pub mod rules;

pub use doctor_name::extract_doctor_name;
pub use phone::normalize_phone;
pub use pipeline::{run_classification, ClassificationPipeline};
pub use remote::{GroqClassifier, RemoteClassification, RemoteClassifier, RemoteError};
pub use rules::{classify_by_rule, RuleDecision};
