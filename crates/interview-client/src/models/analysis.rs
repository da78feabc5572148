use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use super::Account;
use super::null_as_default;

/// Pause statistics of one interview.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PauseAnalytics {
    #[serde(default)]
    pub total_pauses: u64,
    /// Mean pause length in seconds.
    #[serde(default)]
    pub avg_pause: f64,
    /// Individual pause lengths in seconds, in speaking order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub pauses: Vec<f64>,
}

/// One analysed interview.
///
/// Absence is kept distinct from zero: `sentiment_score` and `pause_analytics` are
/// `None` when the backend had nothing to report, and `emotion_scores` is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: i64,
    pub candidate_name: String,
    #[serde(default)]
    pub sentiment_score: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub emotion_scores: BTreeMap<String, f64>,
    #[serde(default, deserialize_with = "empty_pause_analytics_as_none")]
    pub pause_analytics: Option<PauseAnalytics>,
    #[serde(default)]
    pub interview_score: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub feedback: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub video_file: Option<String>,
    #[serde(default)]
    pub user: Option<Account>,
}

impl AnalysisRecord {
    pub fn has_emotions(&self) -> bool {
        !self.emotion_scores.is_empty()
    }

    /// Number of pauses, absent analytics counting as zero.
    pub fn pause_count(&self) -> u64 {
        self.pause_analytics
            .as_ref()
            .map_or(0, |pauses| pauses.total_pauses)
    }

    /// Feedback split into its sentences.
    pub fn feedback_points(&self) -> Vec<&str> {
        self.feedback
            .split(". ")
            .map(str::trim)
            .filter(|point| !point.is_empty())
            .collect()
    }

    /// Emotion with the highest score, ties broken by label order.
    pub fn dominant_emotion(&self) -> Option<(&str, f64)> {
        self.emotion_scores
            .iter()
            .fold(None, |best: Option<(&str, f64)>, (label, &score)| match best {
                Some((_, top)) if top >= score => best,
                _ => Some((label.as_str(), score)),
            })
    }
}

/// The backend stores pause analytics as a JSON object defaulting to `{}`.
fn empty_pause_analytics_as_none<'de, D>(deserializer: D) -> Result<Option<PauseAnalytics>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Object(map)) if map.is_empty() => Ok(None),
        Some(value) => PauseAnalytics::deserialize(value)
            .map(Some)
            .map_err(D::Error::custom),
    }
}
