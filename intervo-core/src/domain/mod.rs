//! Domain entities of the interview engine.
//!
//! Entities are identified by opaque UUIDs and cross-reference each other by
//! id only. The `Interview` aggregate owns its answers and follow-up
//! questions; an `Answer` owns its `Evaluation`.

pub mod answer;
pub mod candidate;
pub mod cv_analysis;
pub mod evaluation;
pub mod follow_up;
pub mod interview;
pub mod question;

pub use answer::{Answer, VoiceMetrics};
pub use candidate::Candidate;
pub use cv_analysis::{CvAnalysis, ExtractedSkill};
pub use evaluation::{attempt_penalty, ConceptGap, Evaluation, GapSeverity};
pub use follow_up::FollowUpQuestion;
pub use interview::{Interview, InterviewStatus, PlanMetadata};
pub use question::{Difficulty, Question, QuestionType};
