//! Data exchanged with the analysis backend.

pub(crate) mod account;
mod analysis;
mod question;

pub use account::{
    Account, InterviewSummary, LoginResponse, Preferences, ProfileRecord, ProfileUpdate,
    RegisterRequest,
};
pub use analysis::{AnalysisRecord, PauseAnalytics};
pub use question::{Difficulty, QuestionCategory, QuestionRecord};

use serde::{Deserialize, Deserializer};

/// Decode `null` as the type's default (e.g. an empty map).
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
