//! Document model.
//!
//! A synced document is structured plain text: an optional `---`
//! frontmatter block, one `# ` header, and `## ` sections holding task
//! lines. Parsing derives that structure while keeping the raw line
//! sequence as the source of truth — the reconciliation engine rewrites
//! documents line by line, never from the derived view, so opaque text
//! survives every pass untouched.

pub mod line;

use std::collections::HashMap;

use crate::model::LocalTask;

/// Name of the implicit bucket for tasks preceding any section heading.
pub const DEFAULT_SECTION: &str = "(unsectioned)";

/// Frontmatter block delimiter.
pub const FRONTMATTER_DELIMITER: &str = "---";

/// Heading prefix that opens a named section.
pub const SECTION_PREFIX: &str = "## ";

/// Heading prefix of the document header.
pub const HEADER_PREFIX: &str = "# ";

/// Span of the frontmatter block within the raw lines.
///
/// The block always opens at line 0; `end` is the index of the closing
/// delimiter line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontmatterSpan {
    pub end: usize,
}

/// One named section and the tasks parsed under it.
#[derive(Debug, Clone)]
pub struct Section {
    pub name: String,
    pub tasks: Vec<LocalTask>,
}

/// A parsed document.
#[derive(Debug, Clone)]
pub struct Document {
    /// Every line of the original content, in order. Source of truth
    /// for rewriting.
    pub raw_lines: Vec<String>,
    /// Frontmatter span, when the very first line is the delimiter and
    /// a closing delimiter follows.
    pub frontmatter: Option<FrontmatterSpan>,
    /// The header line, consumed once and never reconsidered.
    pub header: Option<String>,
    /// Sections in first-appearance order, including the implicit
    /// default bucket when tasks precede any heading.
    pub sections: Vec<Section>,
}

impl Document {
    /// Parse whole-document content.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let raw_lines: Vec<String> = content.split('\n').map(str::to_string).collect();

        let frontmatter = parse_frontmatter(&raw_lines);
        let body_start = frontmatter.map_or(0, |span| span.end + 1);

        // Header: skip blank lines after frontmatter; consume a single
        // `# ` line if it is the first non-blank line.
        let mut header = None;
        let mut cursor = body_start;
        while cursor < raw_lines.len() && raw_lines[cursor].trim().is_empty() {
            cursor += 1;
        }
        if cursor < raw_lines.len() && raw_lines[cursor].starts_with(HEADER_PREFIX) {
            header = Some(raw_lines[cursor].clone());
            cursor += 1;
        }

        let mut sections: Vec<Section> = Vec::new();
        for (offset, raw) in raw_lines[cursor..].iter().enumerate() {
            let line_number = cursor + offset;
            if let Some(name) = section_name(raw) {
                sections.push(Section {
                    name: name.to_string(),
                    tasks: Vec::new(),
                });
            } else if let Some(task) = line::parse(raw, line_number) {
                if sections.is_empty() {
                    sections.push(Section {
                        name: DEFAULT_SECTION.to_string(),
                        tasks: Vec::new(),
                    });
                }
                // The open section is always the last one pushed.
                if let Some(open) = sections.last_mut() {
                    open.tasks.push(task);
                }
            }
        }

        Self {
            raw_lines,
            frontmatter,
            header,
            sections,
        }
    }

    /// Frontmatter block as raw text, delimiters included.
    #[must_use]
    pub fn frontmatter_text(&self) -> Option<String> {
        self.frontmatter
            .map(|span| self.raw_lines[..=span.end].join("\n"))
    }

    /// Map from remote identifier to the task line carrying it.
    ///
    /// Tasks without an identifier are excluded; they are invisible to
    /// the join.
    #[must_use]
    pub fn tasks_by_gid(&self) -> HashMap<String, &LocalTask> {
        self.sections
            .iter()
            .flat_map(|s| &s.tasks)
            .filter_map(|t| t.gid.as_ref().map(|gid| (gid.clone(), t)))
            .collect()
    }
}

/// Frontmatter exists only if the very first line is the delimiter and
/// another delimiter line follows.
fn parse_frontmatter(lines: &[String]) -> Option<FrontmatterSpan> {
    if lines.first().map(|l| l.trim_end()) != Some(FRONTMATTER_DELIMITER) {
        return None;
    }
    lines
        .iter()
        .skip(1)
        .position(|l| l.trim_end() == FRONTMATTER_DELIMITER)
        .map(|offset| FrontmatterSpan { end: offset + 1 })
}

/// Section name of a `## ` heading line, or `None`.
#[must_use]
pub fn section_name(raw: &str) -> Option<&str> {
    raw.strip_prefix(SECTION_PREFIX).map(str::trim)
}

/// Index of section spans over a line sequence, built once per
/// reconciliation pass.
///
/// Maps each `## ` heading to its span: the heading's own line index
/// and the exclusive end — the index of the next heading, or `doc_end`
/// for the last section. New task lines for a section are inserted at
/// the span end, never inside another section's span.
#[derive(Debug)]
pub struct SectionIndex {
    spans: Vec<(String, usize, usize)>,
}

impl SectionIndex {
    /// Build the index. `doc_end` is the exclusive end of insertable
    /// content (callers keep a trailing-newline segment after it).
    #[must_use]
    pub fn build(lines: &[String], doc_end: usize) -> Self {
        let mut spans: Vec<(String, usize, usize)> = Vec::new();
        for (idx, raw) in lines.iter().enumerate().take(doc_end) {
            if let Some(name) = section_name(raw) {
                if let Some(last) = spans.last_mut() {
                    last.2 = idx;
                }
                spans.push((name.to_string(), idx, doc_end));
            }
        }
        Self { spans }
    }

    /// Insertion point for new tasks of the named section: immediately
    /// before the heading that follows it, or `doc_end` for the last
    /// section. `None` when no such heading exists.
    #[must_use]
    pub fn insertion_point(&self, name: &str) -> Option<usize> {
        self.spans
            .iter()
            .find(|(n, _, _)| n == name)
            .map(|&(_, _, end)| end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "\
---
asana_list: 1200
synced: 2025-05-01T10:00:00Z
---

# Roadmap

- [ ] Loose task <!-- id:1 -->

## Doing
- [ ] First <!-- id:2 -->
- [x] Second <!-- id:3 -->
Some prose the engine must never touch.

## Done
- [x] Old <!-- id:4 -->
";

    #[test]
    fn test_parse_frontmatter_span() {
        let doc = Document::parse(DOC);
        let span = doc.frontmatter.unwrap();
        assert_eq!(span.end, 3);
        assert!(doc.frontmatter_text().unwrap().contains("asana_list"));
    }

    #[test]
    fn test_parse_header_once() {
        let doc = Document::parse(DOC);
        assert_eq!(doc.header.as_deref(), Some("# Roadmap"));

        // A second `# ` line is opaque text, not a header.
        let doc = Document::parse("# One\n# Two\n");
        assert_eq!(doc.header.as_deref(), Some("# One"));
    }

    #[test]
    fn test_no_header_when_content_precedes_it() {
        let doc = Document::parse("- [ ] Task <!-- id:1 -->\n# Late heading\n");
        assert_eq!(doc.header, None);
        assert_eq!(doc.sections[0].name, DEFAULT_SECTION);
    }

    #[test]
    fn test_sections_in_first_appearance_order() {
        let doc = Document::parse(DOC);
        let names: Vec<&str> = doc.sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec![DEFAULT_SECTION, "Doing", "Done"]);
        assert_eq!(doc.sections[1].tasks.len(), 2);
        assert_eq!(doc.sections[2].tasks.len(), 1);
    }

    #[test]
    fn test_unclosed_frontmatter_is_body() {
        let doc = Document::parse("---\nnever closed\n- [ ] T <!-- id:1 -->\n");
        assert!(doc.frontmatter.is_none());
        assert_eq!(doc.tasks_by_gid().len(), 1);
    }

    #[test]
    fn test_tasks_by_gid_skips_untagged_lines() {
        let doc = Document::parse("- [ ] Tagged <!-- id:7 -->\n- [ ] Untagged\n");
        let map = doc.tasks_by_gid();
        assert_eq!(map.len(), 1);
        assert_eq!(map["7"].title, "Tagged");
    }

    #[test]
    fn test_raw_lines_roundtrip() {
        let doc = Document::parse(DOC);
        assert_eq!(doc.raw_lines.join("\n"), DOC);
    }

    #[test]
    fn test_section_index_spans() {
        let doc = Document::parse(DOC);
        // Last raw line is the empty segment from the trailing newline.
        let doc_end = doc.raw_lines.len() - 1;
        let index = SectionIndex::build(&doc.raw_lines, doc_end);

        let doing_end = index.insertion_point("Doing").unwrap();
        assert_eq!(doc.raw_lines[doing_end], "## Done");

        assert_eq!(index.insertion_point("Done"), Some(doc_end));
        assert_eq!(index.insertion_point("Missing"), None);
    }
}
