use console::{Color, Term, style};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

static VERBOSE: AtomicBool = AtomicBool::new(false);

fn stderr_is_tty() -> bool {
    Term::stderr().is_term()
}

fn format_label(label: &str, color: Color, is_tty: bool) -> String {
    if is_tty {
        style(label).bold().fg(color).to_string()
    } else {
        label.to_string()
    }
}

fn write_labeled(
    label: &str,
    color: Color,
    msg: &str,
    w: &mut dyn Write,
    is_tty: bool,
) -> io::Result<()> {
    let label = format_label(label, color, is_tty);
    if msg.is_empty() {
        writeln!(w, "{label}")
    } else {
        writeln!(w, "{label} {msg}")
    }
}

pub fn action_to_with_tty(w: &mut dyn Write, label: &str, msg: &str, is_tty: bool) {
    let _ = write_labeled(label, Color::Cyan, msg, w, is_tty);
}

pub fn success_to_with_tty(w: &mut dyn Write, label: &str, msg: &str, is_tty: bool) {
    let _ = write_labeled(label, Color::Green, msg, w, is_tty);
}

pub fn fail_to_with_tty(w: &mut dyn Write, label: &str, msg: &str, is_tty: bool) {
    let _ = write_labeled(label, Color::Red, msg, w, is_tty);
}

pub fn warn_to_with_tty(w: &mut dyn Write, msg: &str, is_tty: bool) {
    let _ = write_labeled("Warning", Color::Yellow, msg, w, is_tty);
}

pub fn detail_to_with_tty(w: &mut dyn Write, msg: &str, is_tty: bool) {
    let line = if is_tty {
        style(format!("  {msg}")).dim().to_string()
    } else {
        format!("  {msg}")
    };
    let _ = writeln!(w, "{line}");
}

pub fn action(label: &str, msg: &str) {
    action_to_with_tty(&mut io::stderr(), label, msg, stderr_is_tty());
}

pub fn success(label: &str, msg: &str) {
    success_to_with_tty(&mut io::stderr(), label, msg, stderr_is_tty());
}

pub fn fail(label: &str, msg: &str) {
    fail_to_with_tty(&mut io::stderr(), label, msg, stderr_is_tty());
}

pub fn warn(msg: &str) {
    warn_to_with_tty(&mut io::stderr(), msg, stderr_is_tty());
}

pub fn detail(msg: &str) {
    detail_to_with_tty(&mut io::stderr(), msg, stderr_is_tty());
}

/// Like [`detail`], but only when `--verbose` is on.
pub fn verbose(msg: &str) {
    if is_verbose() {
        detail(msg);
    }
}

pub fn set_verbose(enabled: bool) {
    VERBOSE.store(enabled, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labeled_line_plain_when_not_tty() {
        let mut buf = Vec::new();
        success_to_with_tty(&mut buf, "Saved", "config.json", false);
        assert_eq!(String::from_utf8(buf).unwrap(), "Saved config.json\n");
    }

    #[test]
    fn test_labeled_line_without_message() {
        let mut buf = Vec::new();
        action_to_with_tty(&mut buf, "Fetching", "", false);
        assert_eq!(String::from_utf8(buf).unwrap(), "Fetching\n");
    }

    #[test]
    fn test_warning_label() {
        let mut buf = Vec::new();
        warn_to_with_tty(&mut buf, "org/a: HTTP 500", false);
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "Warning org/a: HTTP 500\n"
        );
    }

    #[test]
    fn test_detail_is_indented() {
        let mut buf = Vec::new();
        detail_to_with_tty(&mut buf, "GET /user/repos", false);
        assert_eq!(String::from_utf8(buf).unwrap(), "  GET /user/repos\n");
    }

    #[test]
    fn test_tty_label_is_styled() {
        let mut buf = Vec::new();
        fail_to_with_tty(&mut buf, "Failed", "boom", true);
        let out = String::from_utf8(buf).unwrap();
        assert!(out.contains("Failed"));
        assert!(out.contains("boom"));
    }
}
