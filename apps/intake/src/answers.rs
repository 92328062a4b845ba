use std::{fs, path::Path, str::FromStr};

use anyhow::{bail, Context};
use form_core::FormController;
use shared::domain::{AnswerRecord, FieldKey};

/// A `key=value` pair from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub key: FieldKey,
    pub value: String,
}

impl FromStr for Assignment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
        let key = key.trim().parse::<FieldKey>().map_err(|err| err.to_string())?;
        Ok(Self {
            key,
            value: value.to_string(),
        })
    }
}

/// Reads a full or partial answer record. `.json` files are parsed as JSON,
/// anything else as TOML.
pub fn read_answers_file(path: &Path) -> anyhow::Result<AnswerRecord> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read answers file '{}'", path.display()))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let record = if is_json {
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid JSON answers in '{}'", path.display()))?
    } else {
        toml::from_str(&raw)
            .with_context(|| format!("invalid TOML answers in '{}'", path.display()))?
    };
    Ok(record)
}

/// Applies `--set` values first, then `--check` values, each in command-line
/// order. `--set` targets text answers and `--check` checks options.
pub fn apply_assignments(
    controller: &FormController,
    sets: &[Assignment],
    checks: &[Assignment],
) -> anyhow::Result<()> {
    for assignment in sets {
        match assignment.key {
            FieldKey::Text(field) => controller.set_field(field, assignment.value.clone()),
            FieldKey::Set(field) => {
                bail!("'{field}' is a multi-select question; use --check {field}=<option>")
            }
        }
    }

    for assignment in checks {
        match assignment.key {
            FieldKey::Set(field) => controller.toggle_set_member(field, &assignment.value, true),
            FieldKey::Text(field) => {
                bail!("'{field}' takes a single answer; use --set {field}=<value>")
            }
        }
    }

    Ok(())
}
