use colored::*;
use interview_client::aggregation::{self, AggregateSummary};
use interview_client::{Account, AnalysisRecord, ProfileRecord, QuestionRecord};
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::OutputFormat;

#[derive(Tabled)]
struct AnalysisRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Candidate")]
    candidate: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Sentiment")]
    sentiment: String,
    #[tabled(rename = "Pauses")]
    pauses: u64,
}

impl From<&AnalysisRecord> for AnalysisRow {
    fn from(record: &AnalysisRecord) -> Self {
        Self {
            id: record.id,
            candidate: record.candidate_name.clone(),
            date: record.created_at.format("%Y-%m-%d %H:%M").to_string(),
            score: percent(record.interview_score),
            sentiment: sentiment(record.sentiment_score),
            pauses: record.pause_count(),
        }
    }
}

fn percent(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

fn sentiment(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |score| format!("{score:.2}"))
}

/// Colour pretty output only on a terminal, and only if the environment allows
/// it (`NO_COLOR`, `CLICOLOR`).
pub fn use_color(format: OutputFormat, is_terminal: bool) -> bool {
    format == OutputFormat::Pretty
        && is_terminal
        && colored::control::SHOULD_COLORIZE.should_colorize()
}

pub struct OutputManager {
    format: OutputFormat,
    colored: bool,
}

impl OutputManager {
    pub fn new(format: OutputFormat, colored: bool) -> Self {
        Self { format, colored }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    fn colorize(&self, text: &str, color: Color, bold: bool) -> String {
        if !self.colored {
            return text.to_string();
        }
        let styled = text.color(color);
        let styled = if bold { styled.bold() } else { styled };
        styled.to_string()
    }

    fn field(&self, label: &str, value: &str) -> String {
        format!(
            "  {}: {}\n",
            self.colorize(label, Color::Yellow, false),
            self.colorize(value, Color::Cyan, false)
        )
    }

    fn heading(&self, text: &str) -> String {
        format!("{}\n", self.colorize(text, Color::Green, true))
    }

    fn json<T: Serialize + ?Sized>(&self, value: &T) -> serde_json::Result<String> {
        serde_json::to_string_pretty(value)
    }

    /// One-line confirmation, or `{"status": "ok", ...}` in JSON mode.
    pub fn message(&self, message: &str) -> serde_json::Result<String> {
        match self.format {
            OutputFormat::Json => self.json(&serde_json::json!({"status": "ok", "message": message})),
            OutputFormat::Pretty => Ok(format!("{} {message}", self.colorize("✓", Color::Green, true))),
        }
    }

    pub fn account(&self, account: &Account) -> serde_json::Result<String> {
        match self.format {
            OutputFormat::Json => self.json(account),
            OutputFormat::Pretty => {
                let mut output = self.heading("Account:");
                output.push_str(&self.field("ID", &account.id.to_string()));
                output.push_str(&self.field("Username", &account.username));
                output.push_str(&self.field("Name", &account.display_name()));
                output.push_str(&self.field("Email", &account.email));
                Ok(output)
            }
        }
    }

    pub fn analyses(&self, records: &[AnalysisRecord]) -> serde_json::Result<String> {
        match self.format {
            OutputFormat::Json => self.json(records),
            OutputFormat::Pretty if records.is_empty() => {
                Ok("No interviews analysed yet. Upload one with `insight upload`.".to_string())
            }
            OutputFormat::Pretty => {
                let rows: Vec<AnalysisRow> = records.iter().map(AnalysisRow::from).collect();
                Ok(Table::new(rows).with(Style::rounded()).to_string())
            }
        }
    }

    pub fn analysis(&self, record: &AnalysisRecord) -> serde_json::Result<String> {
        if self.format == OutputFormat::Json {
            return self.json(record);
        }

        let mut output = self.heading(&format!("Analysis #{}", record.id));
        output.push_str(&self.field("Candidate", &record.candidate_name));
        output.push_str(&self.field(
            "Date",
            &record.created_at.format("%Y-%m-%d %H:%M UTC").to_string(),
        ));
        output.push_str(&self.field("Interview score", &percent(record.interview_score)));
        output.push_str(&self.field("Sentiment", &sentiment(record.sentiment_score)));

        if record.has_emotions() {
            output.push_str(&format!("  {}:\n", self.colorize("Emotions", Color::Yellow, false)));
            for (label, score) in by_score(record.emotion_scores.iter()) {
                output.push_str(&format!("    {label:<10} {}\n", percent(score)));
            }
        }

        match &record.pause_analytics {
            Some(pauses) => {
                output.push_str(&self.field("Pauses", &pauses.total_pauses.to_string()));
                output.push_str(&self.field("Average pause", &format!("{:.2}s", pauses.avg_pause)));
            }
            None => output.push_str(&self.field("Pauses", "N/A")),
        }

        let points = record.feedback_points();
        if !points.is_empty() {
            output.push_str(&format!("  {}:\n", self.colorize("Feedback", Color::Yellow, false)));
            for point in points {
                output.push_str(&format!("    - {point}\n"));
            }
        }

        if let Some(transcript) = record.transcript.as_deref().filter(|t| !t.trim().is_empty()) {
            output.push_str(&format!("  {}:\n", self.colorize("Transcript", Color::Yellow, false)));
            output.push_str(&format!("    {}\n", transcript.trim()));
        }
        Ok(output)
    }

    pub fn summary(&self, records: &[AnalysisRecord]) -> serde_json::Result<String> {
        let summary = aggregation::summarize(records);
        match self.format {
            OutputFormat::Json => self.json(&SummaryOutput {
                summary: &summary,
                pause_durations: aggregation::pause_durations(records),
            }),
            OutputFormat::Pretty => Ok(self.summary_pretty(&summary, records)),
        }
    }

    fn summary_pretty(&self, summary: &AggregateSummary, records: &[AnalysisRecord]) -> String {
        let mut output = self.heading("Dashboard:");
        output.push_str(&self.field("Interviews", &summary.total_interviews.to_string()));
        output.push_str(&self.field(
            "Overall sentiment",
            &format!("{:.2}", summary.overall_sentiment),
        ));
        output.push_str(&self.field("Total pauses", &summary.total_pauses.to_string()));
        output.push_str(&self.field(
            "Pauses per interview",
            &summary.avg_pauses_per_interview.to_string(),
        ));

        if !summary.overall_emotions.is_empty() {
            output.push_str(&format!("  {}:\n", self.colorize("Emotions", Color::Yellow, false)));
            for (label, score) in by_score(summary.overall_emotions.iter()) {
                output.push_str(&format!("    {label:<10} {}\n", percent(score)));
            }
        }

        let pauses = aggregation::pause_durations(records);
        if summary.total_pauses > 0 && !pauses.is_empty() {
            let strip: Vec<String> = pauses.iter().map(|p| format!("{p:.2}s")).collect();
            output.push_str(&self.field("Pause history", &strip.join(" ")));
        }
        output
    }

    pub fn profile(&self, profile: &ProfileRecord) -> serde_json::Result<String> {
        if self.format == OutputFormat::Json {
            return self.json(profile);
        }

        let mut output = self.account(&profile.account)?;
        if let Some(completed) = profile.interviews_completed {
            output.push_str(&self.field("Interviews completed", &completed.to_string()));
        }
        if let Some(average) = profile.average_score {
            output.push_str(&self.field("Average score", &percent(average)));
        }
        if let Some(last) = profile.last_interview {
            output.push_str(&self.field("Last interview", &last.format("%Y-%m-%d").to_string()));
        }
        if !profile.interview_history.is_empty() {
            output.push_str(&format!("  {}:\n", self.colorize("Recent", Color::Yellow, false)));
            for entry in &profile.interview_history {
                output.push_str(&format!(
                    "    {}  {:<20} {}\n",
                    entry.date.format("%Y-%m-%d"),
                    entry.role,
                    percent(entry.score)
                ));
            }
        }
        Ok(output)
    }

    pub fn questions(&self, questions: &[QuestionRecord]) -> serde_json::Result<String> {
        match self.format {
            OutputFormat::Json => self.json(questions),
            OutputFormat::Pretty if questions.is_empty() => Ok("No questions found.".to_string()),
            OutputFormat::Pretty => {
                let mut output = String::new();
                for (i, question) in questions.iter().enumerate() {
                    output.push_str(&format!(
                        "{} {} {}\n",
                        self.colorize(&format!("{}.", i + 1), Color::Green, true),
                        question.question,
                        self.colorize(
                            &format!("[{} / {}]", question.category, question.difficulty),
                            Color::BrightBlack,
                            false
                        )
                    ));
                    if !question.answer.is_empty() {
                        output.push_str(&format!("   {}\n", question.answer));
                    }
                }
                Ok(output)
            }
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SummaryOutput<'a> {
    #[serde(flatten)]
    summary: &'a AggregateSummary,
    pause_durations: Vec<f64>,
}

/// Highest score first, ties by label.
fn by_score<'a>(scores: impl Iterator<Item = (&'a String, &'a f64)>) -> Vec<(&'a str, f64)> {
    let mut scores: Vec<(&str, f64)> = scores.map(|(label, score)| (label.as_str(), *score)).collect();
    scores.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    scores
}
