//! Plain-text presentation of notes and their AI attachments.

use std::fmt::Write;

use notebook_core::{Mindmap, Note, QuestionOutcome, Quiz, QuizScore, QuizSection};

const RULE: &str = "────────────────────────────────────────";

fn id_label(note: &Note) -> String {
    note.id
        .map(|id| format!("#{}", id))
        .unwrap_or_else(|| "#-".to_string())
}

/// One entry per note: id, title and preview.
pub fn note_list(notes: &[Note]) -> String {
    if notes.is_empty() {
        return "No notes yet. Create one with `notebook new`.\n".to_string();
    }
    let mut out = String::new();
    for note in notes {
        let _ = writeln!(out, "{:>5}  {}", id_label(note), note.title);
        let preview = note.preview();
        if !preview.is_empty() {
            let _ = writeln!(out, "       {}", preview.replace('\n', " "));
        }
    }
    out
}

/// Full read-only view of a note with every attachment that is present.
pub fn note_detail(note: &Note) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", id_label(note), note.title);
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "{}", note.content);

    if let Some(summary) = &note.summary {
        let _ = writeln!(out, "\nSummary\n{}\n{}", RULE, summary);
    }
    if let Some(quiz) = &note.quiz {
        let _ = write!(out, "\nQuiz\n{}\n{}", RULE, quiz_text(quiz, true));
    }
    if let Some(mindmap) = &note.mindmap {
        let _ = write!(out, "\nMind map\n{}\n{}", RULE, mindmap_text(mindmap));
    }
    out
}

pub(crate) fn option_letter(index: usize) -> char {
    (b'A' + (index % 26) as u8) as char
}

/// Quiz questions grouped by section. Empty sections are omitted.
pub fn quiz_text(quiz: &Quiz, show_answers: bool) -> String {
    let sections = quiz.sections();
    if sections.is_empty() {
        return "No quiz questions.\n".to_string();
    }

    let mut out = String::new();
    for section in sections {
        let _ = writeln!(out, "{}", section.heading());
        match section {
            QuizSection::MultipleChoice => {
                for (i, q) in quiz.mcq.iter().flatten().enumerate() {
                    let _ = writeln!(out, "  {}. {}", i + 1, q.question);
                    for (j, option) in q.options.iter().enumerate() {
                        let _ = writeln!(out, "     {}) {}", option_letter(j), option);
                    }
                    if show_answers {
                        let _ = writeln!(out, "     Answer: {}", q.answer);
                    }
                }
            }
            QuizSection::TrueFalse => {
                for (i, q) in quiz.true_false.iter().flatten().enumerate() {
                    let _ = writeln!(out, "  {}. {}", i + 1, q.question);
                    if show_answers {
                        let _ = writeln!(out, "     Answer: {}", if q.answer { "True" } else { "False" });
                    }
                }
            }
            QuizSection::FillBlank => {
                for (i, q) in quiz.fill_blank.iter().flatten().enumerate() {
                    let _ = writeln!(out, "  {}. {}", i + 1, q.question);
                    if show_answers {
                        let _ = writeln!(out, "     Answer: {}", q.answer);
                    }
                }
            }
        }
        out.push('\n');
    }
    out
}

/// Central topic with its branches drawn as a tree.
pub fn mindmap_text(mindmap: &Mindmap) -> String {
    if !mindmap.is_valid() {
        return "Mind map has no central topic.\n".to_string();
    }
    let mut out = String::new();
    let _ = writeln!(out, "{}", mindmap.central);
    let count = mindmap.branches.len();
    for (i, branch) in mindmap.branches.iter().enumerate() {
        let last = i + 1 == count;
        let (joint, indent) = if last { ("└── ", "    ") } else { ("├── ", "│   ") };
        let _ = writeln!(out, "{}{}", joint, branch.topic);

        let subtopics = branch.display_subtopics();
        let sub_count = subtopics.len();
        for (j, sub) in subtopics.into_iter().enumerate() {
            let sub_joint = if j + 1 == sub_count { "└── " } else { "├── " };
            let _ = writeln!(out, "{}{}{}", indent, sub_joint, sub);
        }
    }
    out
}

/// Per-question verdicts and the overall score.
pub fn score_text(score: &QuizScore) -> String {
    let mut out = String::new();
    for graded in &score.questions {
        let verdict = match &graded.outcome {
            QuestionOutcome::Correct => "correct".to_string(),
            QuestionOutcome::Incorrect { expected } => format!("incorrect (answer: {})", expected),
            QuestionOutcome::Unanswered => "skipped".to_string(),
        };
        let _ = writeln!(
            out,
            "{} {}: {}",
            graded.section.heading(),
            graded.index + 1,
            verdict
        );
    }
    match score.percent() {
        Some(pct) => {
            let _ = writeln!(
                out,
                "\nScore: {}/{} ({}%)",
                score.correct, score.answered, pct
            );
        }
        None => {
            let _ = writeln!(out, "\nNo questions answered.");
        }
    }
    out
}
