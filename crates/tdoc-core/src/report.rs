//! Report framing
//!
//! Static validation reports and dynamic debug reports share the same plain-text
//! layout: 70-column rules, uppercase section titles, numbered item lists. Keeping
//! the framing in one place lets the two be printed back to back.

use std::fmt::{Display, Write};

/// Width of report rules
pub const REPORT_WIDTH: usize = 70;

/// `=` rule spanning the report width
#[must_use]
pub fn heavy_rule() -> String {
    "=".repeat(REPORT_WIDTH)
}

/// `-` rule spanning the report width
#[must_use]
pub fn light_rule() -> String {
    "-".repeat(REPORT_WIDTH)
}

/// Push a bordered title block
pub fn push_banner(out: &mut String, title: &str) {
    let _ = writeln!(out, "{}", heavy_rule());
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{}", heavy_rule());
}

/// Push `TITLE (n):` followed by a numbered list; nothing when `items` is empty
pub fn push_numbered<I, T>(out: &mut String, title: &str, items: I)
where
    I: IntoIterator<Item = T>,
    T: Display,
{
    let items: Vec<T> = items.into_iter().collect();
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n{title} ({}):", items.len());
    for (i, item) in items.iter().enumerate() {
        let _ = writeln!(out, "  {}. {item}", i + 1);
    }
}

/// Push a section heading underlined with a light rule
pub fn push_section(out: &mut String, title: &str) {
    let _ = writeln!(out, "\n{title}");
    let _ = writeln!(out, "{}", light_rule());
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn numbered_list() {
        let mut out = String::new();
        push_numbered(&mut out, "ERRORS", ["first", "second"]);
        assert_eq!(out, "\nERRORS (2):\n  1. first\n  2. second\n");
    }

    #[test]
    fn empty_list_renders_nothing() {
        let mut out = String::new();
        push_numbered(&mut out, "WARNINGS", Vec::<String>::new());
        assert!(out.is_empty());
    }

    #[test]
    fn banner_is_framed() {
        let mut out = String::new();
        push_banner(&mut out, "TITLE");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].len(), REPORT_WIDTH);
        assert_eq!(lines[1], "TITLE");
    }
}
