//! Core data models for the notebook client.
//!
//! These types are shared across all notebook crates and represent the
//! entities exchanged with the notes backend and the AI service.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::defaults;
use crate::error::{Error, Result};

// =============================================================================
// NOTE IDENTIFIER
// =============================================================================

/// Server-assigned note identifier (a positive integer on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NoteId(i64);

impl NoteId {
    /// Validate a raw identifier.
    pub fn new(raw: i64) -> Result<Self> {
        if raw > 0 {
            Ok(Self(raw))
        } else {
            Err(Error::Validation(format!(
                "note id must be a positive integer, got {}",
                raw
            )))
        }
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NoteId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let raw = s
            .trim()
            .parse::<i64>()
            .map_err(|_| Error::Validation(format!("malformed note id: {:?}", s)))?;
        Self::new(raw)
    }
}

impl<'de> Deserialize<'de> for NoteId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Str(String),
        }

        let parsed = match Raw::deserialize(deserializer)? {
            Raw::Int(n) => NoteId::new(n),
            Raw::Str(s) => s.parse(),
        };
        parsed.map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// NOTE
// =============================================================================

/// A persisted note as held by the collection cache.
///
/// `quiz` and `mindmap` travel as JSON-encoded strings but are accepted as
/// embedded objects as well; see [`embedded_json`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Note {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<NoteId>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, deserialize_with = "non_blank_text")]
    pub summary: Option<String>,
    #[serde(default, with = "embedded_json")]
    pub quiz: Option<Quiz>,
    #[serde(default, with = "embedded_json")]
    pub mindmap: Option<Mindmap>,
}

impl Note {
    /// Rebuild a note from the payload that was sent for it.
    pub fn from_payload(id: NoteId, payload: &NotePayload) -> Self {
        Self {
            id: Some(id),
            title: payload.title.clone(),
            content: payload.content.clone(),
            summary: payload.summary.clone(),
            quiz: payload
                .quiz
                .as_deref()
                .and_then(|s| serde_json::from_str(s).ok()),
            mindmap: payload
                .mindmap
                .as_deref()
                .and_then(|s| serde_json::from_str(s).ok()),
        }
    }

    /// Short text shown for this note in list view: the summary if present,
    /// otherwise the content, truncated.
    pub fn preview(&self) -> String {
        let source = self.summary.as_deref().unwrap_or(&self.content);
        let mut preview: String = source.chars().take(defaults::PREVIEW_LENGTH).collect();
        if source.chars().count() > defaults::PREVIEW_LENGTH {
            preview.push_str("...");
        }
        preview
    }
}

/// Request body for note create and update (full-document replace).
///
/// Absent attachments are sent as explicit `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotePayload {
    pub title: String,
    pub content: String,
    pub summary: Option<String>,
    pub quiz: Option<String>,
    pub mindmap: Option<String>,
}

impl NotePayload {
    /// Build the wire form, serializing structured attachments and applying
    /// the default title when the title is blank.
    pub fn build(
        title: &str,
        content: &str,
        summary: Option<&str>,
        quiz: Option<&Quiz>,
        mindmap: Option<&Mindmap>,
    ) -> Result<Self> {
        let title = if title.trim().is_empty() {
            defaults::UNTITLED_NOTE.to_string()
        } else {
            title.to_string()
        };
        Ok(Self {
            title,
            content: content.to_string(),
            summary: summary.map(str::to_string),
            quiz: quiz.map(serde_json::to_string).transpose()?,
            mindmap: mindmap.map(serde_json::to_string).transpose()?,
        })
    }
}

fn non_blank_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}

/// Serde adapter for attachments stored as JSON text.
///
/// Serializes `Some(v)` as the JSON string of `v`. Deserializes from a JSON
/// string, an embedded object, or null. Undecodable content is dropped with a
/// warning so one bad attachment never hides the note itself.
pub mod embedded_json {
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::Value;
    use tracing::warn;

    pub fn serialize<S, T>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        match value {
            Some(v) => {
                let text = serde_json::to_string(v).map_err(serde::ser::Error::custom)?;
                serializer.serialize_some(&text)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let raw = Option::<Value>::deserialize(deserializer)?;
        let decoded = match raw {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::String(text)) if text.trim().is_empty() => return Ok(None),
            Some(Value::String(text)) => serde_json::from_str::<T>(&text),
            Some(other) => serde_json::from_value::<T>(other),
        };
        match decoded {
            Ok(v) => Ok(Some(v)),
            Err(e) => {
                warn!(error = %e, "Dropping undecodable note attachment");
                Ok(None)
            }
        }
    }
}

// =============================================================================
// QUIZ
// =============================================================================

/// Multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McqQuestion {
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    pub answer: String,
}

impl McqQuestion {
    /// The answer must be one of the options.
    pub fn is_consistent(&self) -> bool {
        self.options.iter().any(|o| o == &self.answer)
    }
}

/// True/false question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrueFalseQuestion {
    pub question: String,
    #[serde(deserialize_with = "lenient_bool")]
    pub answer: bool,
}

/// Fill-in-the-blank question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillBlankQuestion {
    pub question: String,
    pub answer: String,
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Str(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Bool(b) => Ok(b),
        Raw::Str(s) => match s.trim().to_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "expected true or false, got {:?}",
                other
            ))),
        },
    }
}

/// Generated quiz. Each section is independently optional; a missing or
/// empty section is omitted from display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mcq: Option<Vec<McqQuestion>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub true_false: Option<Vec<TrueFalseQuestion>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_blank: Option<Vec<FillBlankQuestion>>,
}

/// Quiz sections in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuizSection {
    MultipleChoice,
    TrueFalse,
    FillBlank,
}

impl QuizSection {
    pub fn heading(self) -> &'static str {
        match self {
            Self::MultipleChoice => "Multiple Choice Questions",
            Self::TrueFalse => "True or False",
            Self::FillBlank => "Fill in the Blanks",
        }
    }
}

/// A learner's answers, indexed like the questions of each section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuizAnswers {
    pub mcq: Vec<Option<String>>,
    pub true_false: Vec<Option<bool>>,
    pub fill_blank: Vec<Option<String>>,
}

/// Result of grading one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionOutcome {
    Correct,
    Incorrect { expected: String },
    Unanswered,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradedQuestion {
    pub section: QuizSection,
    pub index: usize,
    pub outcome: QuestionOutcome,
}

/// Graded quiz.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuizScore {
    pub questions: Vec<GradedQuestion>,
    pub correct: usize,
    pub answered: usize,
}

impl QuizScore {
    /// Percentage of answered questions that were correct, rounded.
    /// `None` when nothing was answered.
    pub fn percent(&self) -> Option<u32> {
        if self.answered == 0 {
            return None;
        }
        Some(((self.correct as f64 / self.answered as f64) * 100.0).round() as u32)
    }
}

impl Quiz {
    /// True when at least one section key was present in the source.
    pub fn has_any_section(&self) -> bool {
        self.mcq.is_some() || self.true_false.is_some() || self.fill_blank.is_some()
    }

    /// Non-empty sections in display order.
    pub fn sections(&self) -> Vec<QuizSection> {
        let mut sections = Vec::new();
        if self.mcq.as_ref().is_some_and(|q| !q.is_empty()) {
            sections.push(QuizSection::MultipleChoice);
        }
        if self.true_false.as_ref().is_some_and(|q| !q.is_empty()) {
            sections.push(QuizSection::TrueFalse);
        }
        if self.fill_blank.as_ref().is_some_and(|q| !q.is_empty()) {
            sections.push(QuizSection::FillBlank);
        }
        sections
    }

    pub fn question_count(&self) -> usize {
        self.mcq.as_ref().map_or(0, Vec::len)
            + self.true_false.as_ref().map_or(0, Vec::len)
            + self.fill_blank.as_ref().map_or(0, Vec::len)
    }

    /// Drop multiple-choice questions whose answer is not among their
    /// options. Returns how many were dropped.
    pub fn sanitize(&mut self) -> usize {
        let Some(mcq) = self.mcq.as_mut() else {
            return 0;
        };
        let before = mcq.len();
        mcq.retain(|q| {
            let keep = q.is_consistent();
            if !keep {
                warn!(question = %q.question, answer = %q.answer, "Dropping MCQ with answer outside its options");
            }
            keep
        });
        before - mcq.len()
    }

    /// Grade a set of answers against this quiz.
    pub fn grade(&self, answers: &QuizAnswers) -> QuizScore {
        let mut score = QuizScore::default();

        for (i, q) in self.mcq.iter().flatten().enumerate() {
            let given = answers.mcq.get(i).cloned().flatten();
            let outcome = match given {
                None => QuestionOutcome::Unanswered,
                Some(a) if a == q.answer => QuestionOutcome::Correct,
                Some(_) => QuestionOutcome::Incorrect {
                    expected: q.answer.clone(),
                },
            };
            score.record(QuizSection::MultipleChoice, i, outcome);
        }

        for (i, q) in self.true_false.iter().flatten().enumerate() {
            let given = answers.true_false.get(i).copied().flatten();
            let outcome = match given {
                None => QuestionOutcome::Unanswered,
                Some(a) if a == q.answer => QuestionOutcome::Correct,
                Some(_) => QuestionOutcome::Incorrect {
                    expected: if q.answer { "True" } else { "False" }.to_string(),
                },
            };
            score.record(QuizSection::TrueFalse, i, outcome);
        }

        for (i, q) in self.fill_blank.iter().flatten().enumerate() {
            let given = answers
                .fill_blank
                .get(i)
                .cloned()
                .flatten()
                .filter(|a| !a.trim().is_empty());
            let outcome = match given {
                None => QuestionOutcome::Unanswered,
                Some(a) if a.trim().to_lowercase() == q.answer.trim().to_lowercase() => {
                    QuestionOutcome::Correct
                }
                Some(_) => QuestionOutcome::Incorrect {
                    expected: q.answer.clone(),
                },
            };
            score.record(QuizSection::FillBlank, i, outcome);
        }

        score
    }
}

impl QuizScore {
    fn record(&mut self, section: QuizSection, index: usize, outcome: QuestionOutcome) {
        if outcome != QuestionOutcome::Unanswered {
            self.answered += 1;
        }
        if outcome == QuestionOutcome::Correct {
            self.correct += 1;
        }
        self.questions.push(GradedQuestion {
            section,
            index,
            outcome,
        });
    }
}

// =============================================================================
// MIND MAP
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub subtopics: Vec<String>,
}

impl Branch {
    /// Subtopics for display, with a placeholder when there are none.
    pub fn display_subtopics(&self) -> Vec<&str> {
        if self.subtopics.is_empty() {
            vec![defaults::NO_SUBTOPICS_PLACEHOLDER]
        } else {
            self.subtopics.iter().map(String::as_str).collect()
        }
    }
}

/// Generated mind map: one central topic with branches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mindmap {
    #[serde(default)]
    pub central: String,
    #[serde(default)]
    pub branches: Vec<Branch>,
}

impl Mindmap {
    /// A mind map without a central topic is not displayable.
    pub fn is_valid(&self) -> bool {
        !self.central.trim().is_empty()
    }
}

// =============================================================================
// GENERATED ARTIFACTS
// =============================================================================

/// An AI-generated attachment for a draft.
#[derive(Debug, Clone, PartialEq)]
pub enum Generated {
    Summary(String),
    Quiz(Quiz),
    Mindmap(Mindmap),
}

impl Generated {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Summary(_) => "summary",
            Self::Quiz(_) => "quiz",
            Self::Mindmap(_) => "mindmap",
        }
    }
}

/// Text extracted from an uploaded document.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub text: String,
    pub suggested_title: Option<String>,
    pub page_count: Option<u32>,
    /// Endpoint path that produced the result.
    pub endpoint: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_quiz() -> Quiz {
        Quiz {
            mcq: Some(vec![McqQuestion {
                question: "2+2?".to_string(),
                options: vec!["3".to_string(), "4".to_string(), "5".to_string()],
                answer: "4".to_string(),
            }]),
            true_false: Some(vec![TrueFalseQuestion {
                question: "The sky is green".to_string(),
                answer: false,
            }]),
            fill_blank: Some(vec![FillBlankQuestion {
                question: "The capital of France is ____".to_string(),
                answer: "Paris".to_string(),
            }]),
        }
    }

    #[test]
    fn test_note_id_rejects_non_positive() {
        assert!(NoteId::new(0).is_err());
        assert!(NoteId::new(-4).is_err());
        assert_eq!(NoteId::new(7).unwrap().get(), 7);
    }

    #[test]
    fn test_note_id_from_str() {
        assert_eq!("12".parse::<NoteId>().unwrap().get(), 12);
        assert!(matches!("abc".parse::<NoteId>(), Err(Error::Validation(_))));
        assert!(matches!("".parse::<NoteId>(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_note_id_deserializes_number_or_string() {
        let a: NoteId = serde_json::from_value(json!(5)).unwrap();
        let b: NoteId = serde_json::from_value(json!("5")).unwrap();
        assert_eq!(a, b);
        assert!(serde_json::from_value::<NoteId>(json!(-1)).is_err());
    }

    #[test]
    fn test_quiz_round_trip_is_identical() {
        let quiz: Quiz = serde_json::from_value(json!({
            "mcq": [{"question": "2+2?", "options": ["3", "4", "5"], "answer": "4"}]
        }))
        .unwrap();
        let text = serde_json::to_string(&quiz).unwrap();
        let back: Quiz = serde_json::from_str(&text).unwrap();
        assert_eq!(quiz, back);
        assert_eq!(
            serde_json::to_value(&back).unwrap(),
            json!({"mcq": [{"question": "2+2?", "options": ["3", "4", "5"], "answer": "4"}]})
        );
    }

    #[test]
    fn test_note_accepts_embedded_or_encoded_attachments() {
        let encoded = json!({
            "id": 1,
            "title": "T",
            "content": "C",
            "quiz": "{\"mcq\":[{\"question\":\"q\",\"options\":[\"a\"],\"answer\":\"a\"}]}",
            "mindmap": {"central": "Root", "branches": []}
        });
        let note: Note = serde_json::from_value(encoded).unwrap();
        assert_eq!(note.quiz.unwrap().question_count(), 1);
        assert_eq!(note.mindmap.unwrap().central, "Root");
    }

    #[test]
    fn test_note_drops_malformed_attachment() {
        let note: Note = serde_json::from_value(json!({
            "id": 2,
            "title": "T",
            "content": "C",
            "quiz": "{not json",
            "summary": ""
        }))
        .unwrap();
        assert!(note.quiz.is_none());
        assert!(note.summary.is_none());
        assert_eq!(note.title, "T");
    }

    #[test]
    fn test_note_serializes_attachments_as_strings() {
        let note = Note {
            id: NoteId::new(3).ok(),
            title: "T".into(),
            content: "C".into(),
            summary: None,
            quiz: Some(sample_quiz()),
            mindmap: None,
        };
        let value = serde_json::to_value(&note).unwrap();
        assert!(value["quiz"].is_string());
        assert!(value["mindmap"].is_null());
        let back: Note = serde_json::from_value(value).unwrap();
        assert_eq!(back, note);
    }

    #[test]
    fn test_payload_applies_default_title_and_nulls() {
        let payload = NotePayload::build("   ", "body", None, None, None).unwrap();
        assert_eq!(payload.title, defaults::UNTITLED_NOTE);
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            json!({"title": "Untitled Note", "content": "body", "summary": null, "quiz": null, "mindmap": null})
        );
    }

    #[test]
    fn test_note_from_payload_decodes_attachments() {
        let quiz = sample_quiz();
        let payload = NotePayload::build("T", "C", Some("S"), Some(&quiz), None).unwrap();
        let note = Note::from_payload(NoteId::new(9).unwrap(), &payload);
        assert_eq!(note.quiz, Some(quiz));
        assert_eq!(note.summary.as_deref(), Some("S"));
    }

    #[test]
    fn test_preview_prefers_summary_and_truncates() {
        let note = Note {
            content: "x".repeat(150),
            ..Default::default()
        };
        assert_eq!(note.preview().chars().count(), defaults::PREVIEW_LENGTH + 3);

        let summarized = Note {
            content: "long body".into(),
            summary: Some("short".into()),
            ..Default::default()
        };
        assert_eq!(summarized.preview(), "short");
    }

    #[test]
    fn test_sections_skip_missing_and_empty() {
        let quiz = Quiz {
            mcq: Some(vec![]),
            true_false: None,
            fill_blank: sample_quiz().fill_blank,
        };
        assert!(quiz.has_any_section());
        assert_eq!(quiz.sections(), vec![QuizSection::FillBlank]);
        assert!(!Quiz::default().has_any_section());
    }

    #[test]
    fn test_sanitize_drops_inconsistent_mcq() {
        let mut quiz = sample_quiz();
        quiz.mcq.as_mut().unwrap().push(McqQuestion {
            question: "bad".into(),
            options: vec!["a".into(), "b".into()],
            answer: "c".into(),
        });
        assert_eq!(quiz.sanitize(), 1);
        assert_eq!(quiz.mcq.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_true_false_accepts_string_answers() {
        let q: TrueFalseQuestion =
            serde_json::from_value(json!({"question": "q", "answer": "True"})).unwrap();
        assert!(q.answer);
    }

    #[test]
    fn test_grade_mixed_answers() {
        let quiz = sample_quiz();
        let answers = QuizAnswers {
            mcq: vec![Some("4".into())],
            true_false: vec![Some(true)],
            fill_blank: vec![Some("  paris ".into())],
        };
        let score = quiz.grade(&answers);
        assert_eq!(score.answered, 3);
        assert_eq!(score.correct, 2);
        assert_eq!(score.percent(), Some(67));
        assert_eq!(
            score.questions[1].outcome,
            QuestionOutcome::Incorrect {
                expected: "False".into()
            }
        );
    }

    #[test]
    fn test_grade_nothing_answered() {
        let score = sample_quiz().grade(&QuizAnswers {
            fill_blank: vec![Some("   ".into())],
            ..Default::default()
        });
        assert_eq!(score.answered, 0);
        assert_eq!(score.percent(), None);
        assert!(score
            .questions
            .iter()
            .all(|q| q.outcome == QuestionOutcome::Unanswered));
    }

    #[test]
    fn test_mindmap_validity_and_placeholder() {
        let map = Mindmap {
            central: "Rust".into(),
            branches: vec![Branch {
                topic: "Ownership".into(),
                subtopics: vec![],
            }],
        };
        assert!(map.is_valid());
        assert_eq!(
            map.branches[0].display_subtopics(),
            vec![defaults::NO_SUBTOPICS_PLACEHOLDER]
        );
        assert!(!Mindmap::default().is_valid());
    }
}
