//! Interactive quiz practice: ask every question, collect answers.

use std::io::{self, BufRead, Write};

use notebook_core::{Quiz, QuizAnswers, QuizSection};

use crate::render::option_letter;

/// Map an MCQ reply to an option: a letter (`b`), a 1-based number, or the
/// option text itself. Blank means skipped.
fn parse_mcq(reply: &str, options: &[String]) -> Option<String> {
    let reply = reply.trim();
    if reply.is_empty() {
        return None;
    }
    if reply.chars().count() == 1 {
        let letter = reply.chars().next()?.to_ascii_uppercase();
        if let Some(i) = (0..options.len()).find(|&i| option_letter(i) == letter) {
            return Some(options[i].clone());
        }
    }
    if let Ok(n) = reply.parse::<usize>() {
        if (1..=options.len()).contains(&n) {
            return Some(options[n - 1].clone());
        }
    }
    Some(
        options
            .iter()
            .find(|o| o.eq_ignore_ascii_case(reply))
            .cloned()
            .unwrap_or_else(|| reply.to_string()),
    )
}

fn parse_true_false(reply: &str) -> Option<bool> {
    match reply.trim().to_lowercase().as_str() {
        "t" | "true" | "y" | "yes" => Some(true),
        "f" | "false" | "n" | "no" => Some(false),
        _ => None,
    }
}

fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, prompt: &str) -> io::Result<String> {
    write!(output, "{} ", prompt)?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Prompt for every question in display order. End of input leaves the
/// remaining questions unanswered.
pub fn read_answers<R: BufRead, W: Write>(
    quiz: &Quiz,
    input: &mut R,
    output: &mut W,
) -> io::Result<QuizAnswers> {
    let mut answers = QuizAnswers::default();

    for section in quiz.sections() {
        writeln!(output, "\n{}", section.heading())?;
        match section {
            QuizSection::MultipleChoice => {
                for (i, q) in quiz.mcq.iter().flatten().enumerate() {
                    writeln!(output, "{}. {}", i + 1, q.question)?;
                    for (j, option) in q.options.iter().enumerate() {
                        writeln!(output, "   {}) {}", option_letter(j), option)?;
                    }
                    let reply = ask(input, output, ">")?;
                    answers.mcq.push(parse_mcq(&reply, &q.options));
                }
            }
            QuizSection::TrueFalse => {
                for (i, q) in quiz.true_false.iter().flatten().enumerate() {
                    writeln!(output, "{}. {}", i + 1, q.question)?;
                    let reply = ask(input, output, "[t/f] >")?;
                    answers.true_false.push(parse_true_false(&reply));
                }
            }
            QuizSection::FillBlank => {
                for (i, q) in quiz.fill_blank.iter().flatten().enumerate() {
                    writeln!(output, "{}. {}", i + 1, q.question)?;
                    let reply = ask(input, output, ">")?;
                    let reply = reply.trim();
                    answers
                        .fill_blank
                        .push((!reply.is_empty()).then(|| reply.to_string()));
                }
            }
        }
    }
    Ok(answers)
}
