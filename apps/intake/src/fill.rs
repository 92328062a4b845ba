//! Line-oriented walk through the questionnaire.

use std::io::{BufRead, Write};

use anyhow::Result;
use form_core::FormController;
use shared::questionnaire::{InputHint, Question, QuestionKind, QUESTIONS};

/// Reads one line; `None` once the input is exhausted.
pub fn read_line(input: &mut impl BufRead) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let trimmed = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(trimmed);
    Ok(Some(line))
}

/// Resolves a typed answer against an option list: a 1-based option number
/// picks that option, anything else is taken literally.
fn resolve_option(options: &[&str], raw: &str) -> String {
    let raw = raw.trim();
    raw.parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|index| options.get(index))
        .map(|option| option.to_string())
        .unwrap_or_else(|| raw.to_string())
}

fn print_question(output: &mut impl Write, question: &Question) -> Result<()> {
    writeln!(output)?;
    writeln!(output, "{}. {}", question.number, question.prompt)?;
    if let Some(placeholder) = question.placeholder {
        writeln!(output, "   {placeholder}")?;
    }
    match question.kind {
        QuestionKind::Text { hint, .. } => match hint {
            InputHint::Date => writeln!(output, "   (date, e.g. 2026-10-19)")?,
            InputHint::Number => writeln!(output, "   (number)")?,
            InputHint::FreeText | InputHint::LongText => {}
        },
        QuestionKind::Choice { options, .. } => {
            for (index, option) in options.iter().enumerate() {
                writeln!(output, "   [{}] {option}", index + 1)?;
            }
        }
        QuestionKind::MultiChoice { options, .. } => {
            for (index, option) in options.iter().enumerate() {
                writeln!(output, "   [{}] {option}", index + 1)?;
            }
            writeln!(output, "   (several allowed, separated by commas)")?;
        }
    }
    write!(output, "> ")?;
    output.flush()?;
    Ok(())
}

/// Asks every question in order and stores the answers in `controller`.
/// Satellite inputs are only asked for when their trigger is met. Returns
/// `false` if the input ended before the last question.
pub fn fill(
    controller: &FormController,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Result<bool> {
    for question in &QUESTIONS {
        print_question(output, question)?;
        let Some(answer) = read_line(input)? else {
            return Ok(false);
        };

        match question.kind {
            QuestionKind::Text { field, .. } => controller.set_field(field, answer),
            QuestionKind::Choice { field, options } => {
                if !answer.trim().is_empty() {
                    controller.set_field(field, resolve_option(options, &answer));
                }
            }
            QuestionKind::MultiChoice { field, options } => {
                for raw in answer.split(',').filter(|raw| !raw.trim().is_empty()) {
                    controller.toggle_set_member(field, &resolve_option(options, raw), true);
                }
            }
        }

        let Some(satellite) = question.satellite else {
            continue;
        };
        if !question.satellite_active(&controller.snapshot()) {
            continue;
        }

        write!(output, "   {} ", satellite.prompt)?;
        output.flush()?;
        let Some(extra) = read_line(input)? else {
            return Ok(false);
        };
        controller.set_field(satellite.field, extra);
    }

    Ok(true)
}

/// Asks a yes/no question; anything but `y`/`yes` counts as no.
pub fn confirm(input: &mut impl BufRead, output: &mut impl Write, prompt: &str) -> Result<bool> {
    write!(output, "{prompt} [y/N] ")?;
    output.flush()?;
    Ok(read_line(input)?
        .map(|answer| matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
        .unwrap_or(false))
}
