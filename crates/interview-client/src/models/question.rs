use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionCategory {
    #[default]
    Technical,
    Behavioral,
    SystemDesign,
    ProblemSolving,
    Leadership,
    #[serde(other)]
    Other,
}

impl QuestionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Technical => "technical",
            Self::Behavioral => "behavioral",
            Self::SystemDesign => "system_design",
            Self::ProblemSolving => "problem_solving",
            Self::Leadership => "leadership",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for QuestionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
    #[serde(other)]
    Other,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A practice question returned by the question search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub category: QuestionCategory,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_question() {
        let question: QuestionRecord = serde_json::from_str(
            r#"{"role": "Backend Engineer", "category": "system_design", "difficulty": "advanced",
                "question": "Design a URL shortener.", "answer": "Start with the API."}"#,
        )
        .unwrap();
        assert_eq!(question.category, QuestionCategory::SystemDesign);
        assert_eq!(question.difficulty, Difficulty::Advanced);
        assert_eq!(question.category.to_string(), "system_design");
    }

    #[test]
    fn test_unknown_labels_fall_back() {
        let question: QuestionRecord = serde_json::from_str(
            r#"{"category": "culture_fit", "difficulty": "expert", "question": "Why us?"}"#,
        )
        .unwrap();
        assert_eq!(question.category, QuestionCategory::Other);
        assert_eq!(question.difficulty, Difficulty::Other);
        assert!(question.role.is_empty());

        let question: QuestionRecord =
            serde_json::from_str(r#"{"question": "Tell me about yourself."}"#).unwrap();
        assert_eq!(question.category, QuestionCategory::Technical);
        assert_eq!(question.difficulty, Difficulty::Intermediate);
    }
}
