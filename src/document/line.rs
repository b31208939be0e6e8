//! Task line codec.
//!
//! One checkbox line is the atomic unit of sync. The grammar is fixed
//! and strict:
//!
//! ```text
//! - [ ] <title> [📅 YYYY-MM-DD] [👤 <name>] [<!-- id:<gid> -->]
//! ```
//!
//! The checkbox is `[ ]` or `[x]`/`[X]`; the bracketed segments are
//! optional but must appear in exactly this order when present; trailing
//! whitespace is insignificant. Any line that does not match this shape
//! (including a checkbox line whose markers are out of order) is not a
//! task and is preserved as opaque text.
//!
//! The implementation is a tokenizer/parser pair: a compiled pattern
//! recognizes the checkbox head, then an explicit scanner splits the
//! remainder into marker segments and validates their order and shape.
//! `format` is the exact inverse of `parse` for every field it controls.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::model::{DisplayOptions, LocalTask, RemoteTask};

/// Due date marker token.
pub const DUE_MARKER: &str = "📅";
/// Assignee marker token.
pub const ASSIGNEE_MARKER: &str = "👤";
/// Identifier comment opener (gid follows immediately).
const ID_OPEN: &str = "<!-- id:";
/// Identifier comment closer.
const ID_CLOSE: &str = "-->";

/// Checkbox head: `- [ ] ` / `- [x] ` / `- [X] ` at start of line.
static CHECKBOX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^- \[([ xX])\] (.*)$").unwrap());

/// Marker segments cut out of the text after the checkbox head.
///
/// Produced by [`tokenize`]; all slices borrow from the input line.
#[derive(Debug, PartialEq, Eq)]
struct Segments<'a> {
    title: &'a str,
    due: Option<&'a str>,
    assignee: Option<&'a str>,
    id: Option<&'a str>,
}

/// Split the post-checkbox text into title and marker segments.
///
/// Returns `None` when the markers present are not in the required
/// due → assignee → identifier order.
fn tokenize(rest: &str) -> Option<Segments<'_>> {
    let due_idx = rest.find(DUE_MARKER);
    let assignee_idx = rest.find(ASSIGNEE_MARKER);
    let id_idx = rest.find(ID_OPEN);

    // Strict order: each marker present must start after every earlier
    // marker kind that is also present.
    let order = [due_idx, assignee_idx, id_idx];
    let mut last = 0usize;
    for idx in order.into_iter().flatten() {
        if idx < last {
            return None;
        }
        last = idx;
    }

    let title_end = order.into_iter().flatten().min().unwrap_or(rest.len());

    let slice_between = |start: Option<usize>, marker: &str, next: &[Option<usize>]| {
        start.map(|s| {
            let from = s + marker.len();
            let to = next.iter().flatten().copied().min().unwrap_or(rest.len());
            &rest[from..to]
        })
    };

    Some(Segments {
        title: rest[..title_end].trim(),
        due: slice_between(due_idx, DUE_MARKER, &[assignee_idx, id_idx]),
        assignee: slice_between(assignee_idx, ASSIGNEE_MARKER, &[id_idx]),
        id: id_idx.map(|s| &rest[s..]),
    })
}

/// Parse the identifier comment segment: `<!-- id:<gid> -->` with
/// nothing after the closer. The gid is a single opaque token.
fn parse_id(segment: &str) -> Option<&str> {
    let inner = segment.strip_prefix(ID_OPEN)?;
    let close = inner.find(ID_CLOSE)?;
    if !inner[close + ID_CLOSE.len()..].trim().is_empty() {
        return None;
    }
    let gid = inner[..close].trim();
    if gid.is_empty() || gid.contains(char::is_whitespace) {
        return None;
    }
    Some(gid)
}

/// Parse one line of text into a task, or `None` if the line does not
/// match the task grammar.
///
/// `line_number` is the zero-based position of the line within its
/// document; it is carried on the returned [`LocalTask`] untouched.
#[must_use]
pub fn parse(line: &str, line_number: usize) -> Option<LocalTask> {
    let caps = CHECKBOX.captures(line.trim_end())?;
    let completed = &caps[1] != " ";
    let segments = tokenize(caps.get(2).map_or("", |m| m.as_str()))?;

    let due_on = match segments.due {
        Some(text) => Some(NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()?),
        None => None,
    };

    let assignee = match segments.assignee {
        Some(text) => {
            let name = text.trim();
            if name.is_empty() {
                return None;
            }
            Some(name.to_string())
        }
        None => None,
    };

    let gid = match segments.id {
        Some(text) => Some(parse_id(text)?.to_string()),
        None => None,
    };

    Some(LocalTask {
        line: line.to_string(),
        line_number,
        completed,
        title: segments.title.to_string(),
        due_on,
        assignee,
        gid,
    })
}

/// Format a remote task snapshot as one document line.
///
/// Deterministic: the visible form is a pure function of the snapshot
/// and the display options. A marker is omitted when the corresponding
/// option is off or the field is absent; the identifier comment is
/// always emitted.
#[must_use]
pub fn format(task: &RemoteTask, options: DisplayOptions) -> String {
    let mark = if task.completed { 'x' } else { ' ' };
    let mut line = format!("- [{mark}] {}", task.name.trim());

    if options.show_due_date {
        if let Some(due) = task.due_on {
            line.push_str(&format!(" {DUE_MARKER} {}", due.format("%Y-%m-%d")));
        }
    }

    if options.show_assignee {
        if let Some(assignee) = &task.assignee {
            line.push_str(&format!(" {ASSIGNEE_MARKER} {}", assignee.name.trim()));
        }
    }

    line.push_str(&format!(" {ID_OPEN}{} {ID_CLOSE}", task.gid));
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Assignee;

    fn task(gid: &str, name: &str, completed: bool) -> RemoteTask {
        RemoteTask {
            gid: gid.to_string(),
            name: name.to_string(),
            completed,
            due_on: None,
            assignee: None,
            notes: None,
            permalink_url: None,
            memberships: Vec::new(),
        }
    }

    #[test]
    fn test_parse_bare_checkbox() {
        let parsed = parse("- [ ] Write release notes", 3).unwrap();
        assert_eq!(parsed.title, "Write release notes");
        assert!(!parsed.completed);
        assert_eq!(parsed.line_number, 3);
        assert_eq!(parsed.gid, None);
        assert_eq!(parsed.due_on, None);
        assert_eq!(parsed.assignee, None);
    }

    #[test]
    fn test_parse_full_line() {
        let line = "- [x] Ship v2 📅 2025-06-01 👤 Dana Smith <!-- id:1203986 -->";
        let parsed = parse(line, 0).unwrap();
        assert!(parsed.completed);
        assert_eq!(parsed.title, "Ship v2");
        assert_eq!(
            parsed.due_on,
            Some(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap())
        );
        assert_eq!(parsed.assignee.as_deref(), Some("Dana Smith"));
        assert_eq!(parsed.gid.as_deref(), Some("1203986"));
    }

    #[test]
    fn test_parse_uppercase_x_and_trailing_whitespace() {
        let parsed = parse("- [X] Done thing <!-- id:9 -->   ", 0).unwrap();
        assert!(parsed.completed);
        assert_eq!(parsed.gid.as_deref(), Some("9"));
    }

    #[test]
    fn test_out_of_order_markers_are_not_a_task() {
        assert!(parse("- [ ] T 👤 Bob 📅 2025-01-02", 0).is_none());
        assert!(parse("- [ ] T <!-- id:1 --> 📅 2025-01-02", 0).is_none());
    }

    #[test]
    fn test_invalid_date_is_not_a_task() {
        assert!(parse("- [ ] T 📅 tomorrow", 0).is_none());
        assert!(parse("- [ ] T 📅 2025-13-45", 0).is_none());
    }

    #[test]
    fn test_malformed_id_comment_is_not_a_task() {
        assert!(parse("- [ ] T <!-- id: -->", 0).is_none());
        assert!(parse("- [ ] T <!-- id:1 --> trailing", 0).is_none());
        assert!(parse("- [ ] T <!-- id:a b -->", 0).is_none());
    }

    #[test]
    fn test_non_checkbox_lines_are_opaque() {
        assert!(parse("Just prose", 0).is_none());
        assert!(parse("* [ ] wrong bullet", 0).is_none());
        assert!(parse("## Heading", 0).is_none());
        assert!(parse("- [] missing space", 0).is_none());
    }

    #[test]
    fn test_roundtrip_all_fields() {
        let mut t = task("42", "Review budget", false);
        t.due_on = NaiveDate::from_ymd_opt(2025, 12, 24);
        t.assignee = Some(Assignee {
            gid: "7".to_string(),
            name: "Kim".to_string(),
        });

        let line = format(&t, DisplayOptions::default());
        let parsed = parse(&line, 0).unwrap();

        assert_eq!(parsed.title, t.name);
        assert_eq!(parsed.completed, t.completed);
        assert_eq!(parsed.due_on, t.due_on);
        assert_eq!(parsed.assignee.as_deref(), Some("Kim"));
        assert_eq!(parsed.gid.as_deref(), Some("42"));
    }

    #[test]
    fn test_roundtrip_is_stable() {
        let mut t = task("42", "Review budget", true);
        t.due_on = NaiveDate::from_ymd_opt(2025, 12, 24);

        let once = format(&t, DisplayOptions::default());
        let parsed = parse(&once, 0).unwrap();
        let again = format(
            &RemoteTask {
                gid: parsed.gid.clone().unwrap(),
                name: parsed.title.clone(),
                completed: parsed.completed,
                due_on: parsed.due_on,
                assignee: None,
                notes: None,
                permalink_url: None,
                memberships: Vec::new(),
            },
            DisplayOptions::default(),
        );
        assert_eq!(once, again);
    }

    #[test]
    fn test_format_honors_display_options() {
        let mut t = task("5", "Plan offsite", false);
        t.due_on = NaiveDate::from_ymd_opt(2025, 3, 1);
        t.assignee = Some(Assignee {
            gid: "8".to_string(),
            name: "Lee".to_string(),
        });

        let opts = DisplayOptions {
            show_due_date: false,
            show_assignee: false,
            show_completed: true,
        };
        assert_eq!(format(&t, opts), "- [ ] Plan offsite <!-- id:5 -->");
    }
}
