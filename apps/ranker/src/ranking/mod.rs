// Resume ranking: criteria extraction, per-resume scoring and the ranked report.
// Model output is never trusted as-is; it goes through recovery, the name policy and
// the aggregator before it reaches the table.

pub mod aggregator;
pub mod completion;
pub mod handlers;
pub mod models;
pub mod name_policy;
pub mod pipeline;
pub mod prompts;
pub mod recovery;
pub mod table;
