//! Interactive prompts: the setup wizard and the time-window menu.
//!
//! Everything here reads from a `BufRead` and writes prompts to a `Write`,
//! so callers pass stdin/stderr and tests pass in-memory buffers. Commands
//! only reach this module when stdin is a terminal.

use anyhow::{Context, Result, bail};
use std::io::{BufRead, Write};
use std::path::Path;
use time::OffsetDateTime;

use crate::config::{CliConfig, ConfigField, parse_repository_list};
use crate::window::TimeWindow;

/// Answer to the repository prompt that clears the saved list.
const CLEAR_REPOSITORIES: &str = "-";

/// Ask for every setting in turn and save once at the end.
///
/// Pressing enter keeps the current value. A value that was never set stays
/// unset.
pub fn run_setup_wizard(
    config: &mut CliConfig,
    save_path: &Path,
    input: &mut dyn BufRead,
    output: &mut dyn Write,
) -> Result<()> {
    writeln!(output, "GitHub Daily Report setup")?;
    writeln!(output, "Press enter to keep the current value.")?;
    writeln!(output)?;

    prompt_field(config, ConfigField::GithubToken, "GitHub personal access token", input, output)?;
    prompt_field(config, ConfigField::GithubUsername, "GitHub username", input, output)?;

    writeln!(output)?;
    writeln!(
        output,
        "Repositories to inspect, as owner/repo separated by commas (e.g. octocat/app, octocat/lib)."
    )?;
    writeln!(output, "Without a list your repositories are discovered automatically.")?;
    writeln!(output, "Enter {CLEAR_REPOSITORIES} to clear a saved list.")?;
    let current = config.repositories.join(", ");
    let current = (!current.is_empty()).then_some(current);
    match prompt_line(input, output, "Repositories", current.as_deref())? {
        Some(raw) if raw == CLEAR_REPOSITORIES => config.repositories.clear(),
        Some(raw) if current.as_deref() != Some(raw.as_str()) => {
            config.repositories = parse_repository_list(&raw);
        }
        _ => {}
    }

    writeln!(output)?;
    writeln!(output, "Before continuing, make sure that in Notion you have:")?;
    writeln!(output, "  1. created an integration")?;
    writeln!(output, "  2. connected the integration to your report database")?;
    writeln!(
        output,
        "  3. given the database a title property and a date property"
    )?;
    prompt_field(config, ConfigField::NotionToken, "Notion integration token", input, output)?;
    prompt_field(config, ConfigField::NotionDatabaseId, "Notion database id", input, output)?;

    config.save_to(save_path)?;
    writeln!(output)?;
    writeln!(output, "Configuration saved to {}", save_path.display())?;
    Ok(())
}

fn prompt_field(
    config: &mut CliConfig,
    field: ConfigField,
    label: &str,
    input: &mut dyn BufRead,
    output: &mut dyn Write,
) -> Result<()> {
    let current = config.get(field);
    let shown = match (&current, field.is_secret()) {
        (Some(_), true) => Some("set".to_string()),
        (value, _) => value.clone(),
    };
    let answer = read_trimmed(input, output, &format_prompt(label, shown.as_deref()))?;
    if !answer.is_empty() {
        config.set(field, &answer);
    }
    Ok(())
}

/// Show the time-window menu and build the chosen window.
///
/// `1` (the default) is yesterday plus the early morning of today, `2` a
/// custom range in UTC, `3` today.
pub fn choose_window(
    now: OffsetDateTime,
    input: &mut dyn BufRead,
    output: &mut dyn Write,
) -> Result<TimeWindow> {
    writeln!(output, "Choose the time window:")?;
    writeln!(output, "  1) yesterday + early morning until 06:00 (default)")?;
    writeln!(output, "  2) custom range")?;
    writeln!(output, "  3) today")?;
    let choice = read_trimmed(input, output, "Select [1/2/3]: ")?;

    match choice.as_str() {
        "" | "1" => Ok(TimeWindow::overnight(now)),
        "3" => Ok(TimeWindow::today(now)),
        "2" => {
            let suggested = TimeWindow::overnight(now);
            let describe = suggested.describe();
            let (default_start, default_end) = describe
                .split_once(" ~ ")
                .unwrap_or((describe.as_str(), describe.as_str()));
            writeln!(output, "Enter times as YYYY-MM-DD HH:MM (UTC).")?;
            let start = prompt_line(input, output, "Start", Some(default_start))?
                .unwrap_or_default();
            let end = prompt_line(input, output, "End", Some(default_end))?.unwrap_or_default();
            let report_date =
                prompt_line(input, output, "Report date", Some(&suggested.report_date))?;
            TimeWindow::custom(&start, &end, report_date.as_deref())
        }
        other => bail!("invalid choice '{other}', expected 1, 2 or 3"),
    }
}

/// Prompt for one line. Empty input yields `default`.
pub fn prompt_line(
    input: &mut dyn BufRead,
    output: &mut dyn Write,
    label: &str,
    default: Option<&str>,
) -> Result<Option<String>> {
    let answer = read_trimmed(input, output, &format_prompt(label, default))?;
    if answer.is_empty() {
        Ok(default.map(str::to_string))
    } else {
        Ok(Some(answer))
    }
}

/// Ask a yes/no question. Empty input yields `default_yes`.
pub fn read_yes_no(
    input: &mut dyn BufRead,
    output: &mut dyn Write,
    prompt: &str,
    default_yes: bool,
) -> Result<bool> {
    let answer = read_trimmed(input, output, prompt)?.to_ascii_lowercase();
    if answer.is_empty() {
        return Ok(default_yes);
    }
    Ok(matches!(answer.as_str(), "y" | "yes"))
}

fn format_prompt(label: &str, current: Option<&str>) -> String {
    match current {
        Some(value) => format!("{label} [{value}]: "),
        None => format!("{label}: "),
    }
}

fn read_trimmed(input: &mut dyn BufRead, output: &mut dyn Write, prompt: &str) -> Result<String> {
    write!(output, "{prompt}")?;
    output.flush().ok();
    let mut line = String::new();
    input.read_line(&mut line).context("failed to read input")?;
    Ok(line.trim().to_string())
}
