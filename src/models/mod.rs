pub mod attempt;
pub mod outcome;
pub mod request;

pub use attempt::{MergeAttempt, Signature};
pub use outcome::MergeOutcome;
pub use request::{MergeRequest, MergeRequestStatus};
