//! Dashboard aggregation.
//!
//! Pure folds over a snapshot of [`AnalysisRecord`]s. Absent values never count
//! as zero: each statistic divides only by the records that carry its data, so
//! the sentiment and emotion denominators may differ for the same input.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::AnalysisRecord;

/// Decimal places kept for the overall sentiment.
const SENTIMENT_PRECISION: i32 = 2;
/// Decimal places kept for each averaged emotion.
const EMOTION_PRECISION: i32 = 4;

/// Dashboard-level statistics derived from a list of records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateSummary {
    pub total_interviews: usize,
    pub overall_sentiment: f64,
    pub overall_emotions: BTreeMap<String, f64>,
    pub total_pauses: u64,
    pub avg_pauses_per_interview: u64,
}

/// Compute every statistic in one call.
pub fn summarize(records: &[AnalysisRecord]) -> AggregateSummary {
    AggregateSummary {
        total_interviews: total_interviews(records),
        overall_sentiment: overall_sentiment(records),
        overall_emotions: overall_emotions(records),
        total_pauses: total_pauses(records),
        avg_pauses_per_interview: avg_pauses_per_interview(records),
    }
}

pub fn total_interviews(records: &[AnalysisRecord]) -> usize {
    records.len()
}

/// Mean sentiment over the records that have one, `0.0` if none does.
pub fn overall_sentiment(records: &[AnalysisRecord]) -> f64 {
    let (sum, count) = records
        .iter()
        .filter_map(|record| record.sentiment_score)
        .fold((0.0, 0usize), |(sum, count), score| (sum + score, count + 1));

    if count == 0 {
        return 0.0;
    }
    round_to(sum / count as f64, SENTIMENT_PRECISION)
}

/// Mean score per emotion label.
///
/// The denominator is the number of records with a non-empty emotion map, for
/// every label, including labels that only some of those records report.
pub fn overall_emotions(records: &[AnalysisRecord]) -> BTreeMap<String, f64> {
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    let mut with_emotions = 0usize;

    for record in records.iter().filter(|record| record.has_emotions()) {
        with_emotions += 1;
        for (label, score) in &record.emotion_scores {
            *totals.entry(label.clone()).or_default() += score;
        }
    }

    if with_emotions == 0 {
        return BTreeMap::new();
    }

    totals
        .into_iter()
        .map(|(label, total)| (label, round_to(total / with_emotions as f64, EMOTION_PRECISION)))
        .collect()
}

/// Sum of pause counts, absent analytics counting as zero.
pub fn total_pauses(records: &[AnalysisRecord]) -> u64 {
    records.iter().map(AnalysisRecord::pause_count).sum()
}

/// Pauses per interview rounded to the nearest integer, `0` for no records.
pub fn avg_pauses_per_interview(records: &[AnalysisRecord]) -> u64 {
    if records.is_empty() {
        return 0;
    }
    (total_pauses(records) as f64 / records.len() as f64).round() as u64
}

/// Every individual pause duration, in record order.
pub fn pause_durations(records: &[AnalysisRecord]) -> Vec<f64> {
    records
        .iter()
        .filter_map(|record| record.pause_analytics.as_ref())
        .flat_map(|analytics| analytics.pauses.iter().copied())
        .collect()
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PauseAnalytics;
    use chrono::Utc;

    const EPSILON: f64 = 1e-9;

    fn record(id: i64) -> AnalysisRecord {
        AnalysisRecord {
            id,
            candidate_name: format!("candidate-{id}"),
            sentiment_score: None,
            emotion_scores: BTreeMap::new(),
            pause_analytics: None,
            interview_score: 0.0,
            feedback: String::new(),
            created_at: Utc::now(),
            updated_at: None,
            transcript: None,
            video_file: None,
            user: None,
        }
    }

    fn with_sentiment(id: i64, score: Option<f64>) -> AnalysisRecord {
        AnalysisRecord {
            sentiment_score: score,
            ..record(id)
        }
    }

    fn with_emotions(id: i64, emotions: &[(&str, f64)]) -> AnalysisRecord {
        AnalysisRecord {
            emotion_scores: emotions
                .iter()
                .map(|(label, score)| (label.to_string(), *score))
                .collect(),
            ..record(id)
        }
    }

    fn with_pauses(id: i64, pauses: &[f64]) -> AnalysisRecord {
        AnalysisRecord {
            pause_analytics: Some(PauseAnalytics {
                total_pauses: pauses.len() as u64,
                avg_pause: 0.0,
                pauses: pauses.to_vec(),
            }),
            ..record(id)
        }
    }

    #[test]
    fn test_overall_sentiment_empty() {
        assert_eq!(overall_sentiment(&[]), 0.0);
        assert_eq!(overall_sentiment(&[record(1), record(2)]), 0.0);
    }

    #[test]
    fn test_overall_sentiment_ignores_absent_scores() {
        let records = [
            with_sentiment(1, Some(0.8)),
            with_sentiment(2, None),
            with_sentiment(3, Some(0.4)),
        ];
        assert!((overall_sentiment(&records) - 0.6).abs() < EPSILON);
    }

    #[test]
    fn test_overall_sentiment_keeps_zero_scores() {
        let records = [with_sentiment(1, Some(0.0)), with_sentiment(2, Some(0.5))];
        assert!((overall_sentiment(&records) - 0.25).abs() < EPSILON);
    }

    #[test]
    fn test_overall_sentiment_rounds_to_two_places() {
        let records = [
            with_sentiment(1, Some(0.333)),
            with_sentiment(2, Some(0.334)),
            with_sentiment(3, Some(0.335)),
        ];
        assert!((overall_sentiment(&records) - 0.33).abs() < EPSILON);
    }

    #[test]
    fn test_overall_emotions_divides_by_records_with_emotions() {
        let records = [
            with_emotions(1, &[("joy", 0.2)]),
            with_emotions(2, &[]),
            with_emotions(3, &[("joy", 0.6), ("fear", 0.4)]),
        ];
        let emotions = overall_emotions(&records);

        assert_eq!(emotions.len(), 2);
        assert!((emotions["joy"] - 0.4).abs() < EPSILON);
        // Two records carry emotion data, so a label reported once is halved.
        assert!((emotions["fear"] - 0.2).abs() < EPSILON);
    }

    #[test]
    fn test_overall_emotions_without_data() {
        assert!(overall_emotions(&[]).is_empty());
        assert!(overall_emotions(&[record(1), with_emotions(2, &[])]).is_empty());
    }

    #[test]
    fn test_sentiment_and_emotion_denominators_differ() {
        let records = [
            AnalysisRecord {
                sentiment_score: Some(0.9),
                ..with_emotions(1, &[("joy", 0.5)])
            },
            with_sentiment(2, Some(0.3)),
        ];
        assert!((overall_sentiment(&records) - 0.6).abs() < EPSILON);
        assert!((overall_emotions(&records)["joy"] - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_pause_totals() {
        assert_eq!(total_pauses(&[]), 0);
        assert_eq!(avg_pauses_per_interview(&[]), 0);

        let records = [
            with_pauses(1, &[1.0, 2.0, 0.5]),
            with_pauses(2, &[0.7, 0.8, 0.9, 1.1, 1.2]),
        ];
        assert_eq!(total_pauses(&records), 8);
        assert_eq!(avg_pauses_per_interview(&records), 4);
    }

    #[test]
    fn test_avg_pauses_counts_records_without_analytics() {
        let records = [with_pauses(1, &[1.0, 1.0, 1.0]), record(2)];
        assert_eq!(total_pauses(&records), 3);
        // 1.5 rounds up
        assert_eq!(avg_pauses_per_interview(&records), 2);
    }

    #[test]
    fn test_pause_durations_keep_record_order() {
        let records = [
            with_pauses(1, &[1.5, 0.5]),
            record(2),
            with_pauses(3, &[2.25]),
        ];
        assert_eq!(pause_durations(&records), vec![1.5, 0.5, 2.25]);
    }

    #[test]
    fn test_aggregation_is_order_insensitive() {
        let mut records = vec![
            AnalysisRecord {
                sentiment_score: Some(0.2),
                ..with_pauses(1, &[1.0])
            },
            with_emotions(2, &[("joy", 0.3), ("anger", 0.1)]),
            AnalysisRecord {
                sentiment_score: Some(0.7),
                ..with_emotions(3, &[("joy", 0.9)])
            },
        ];
        let forward = summarize(&records);
        records.reverse();
        let backward = summarize(&records);

        assert_eq!(forward, backward);
    }

    #[test]
    fn test_summarize() {
        let records = [
            AnalysisRecord {
                sentiment_score: Some(0.8),
                ..with_pauses(1, &[1.0, 2.0])
            },
            with_emotions(2, &[("calm", 1.0)]),
        ];
        let summary = summarize(&records);

        assert_eq!(summary.total_interviews, 2);
        assert!((summary.overall_sentiment - 0.8).abs() < EPSILON);
        assert_eq!(summary.overall_emotions.len(), 1);
        assert_eq!(summary.total_pauses, 2);
        assert_eq!(summary.avg_pauses_per_interview, 1);

        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("avgPausesPerInterview").is_some());
    }
}
