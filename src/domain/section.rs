//! Section-aware editing of markdown documents.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Level assumed for a target header that carries no leading `#`.
pub const DEFAULT_SECTION_LEVEL: usize = 2;

static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#+)\s").expect("header pattern is valid"));

/// A markdown note held as an ordered sequence of lines.
///
/// Documents are read fresh from the vault on every invocation, edited in
/// memory, and written back wholesale. No I/O happens here.
///
/// # Examples
///
/// ```
/// use briefing::domain::Document;
///
/// let mut doc = Document::parse("# Day\n## Tasks\n- buy milk\n## Notes");
/// let outcome = doc.insert_into_section("## Tasks", "- call bank");
///
/// assert!(outcome.section_found);
/// assert_eq!(doc.to_text(), "# Day\n## Tasks\n- buy milk\n- call bank\n## Notes");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    lines: Vec<String>,
}

/// Where [`Document::insert_into_section`] placed the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionInsert {
    /// Whether the target header already existed in the document.
    pub section_found: bool,
    /// Line index of the inserted content.
    pub line: usize,
}

impl Document {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a document from pre-split lines.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Splits note text on newline boundaries.
    ///
    /// The empty string yields a document with no lines. A trailing newline
    /// yields a trailing empty line, so `parse(s).to_text() == s`.
    pub fn parse(text: &str) -> Self {
        if text.is_empty() {
            return Self::new();
        }
        Self::from_lines(text.split('\n'))
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Joins the lines back into note text with `\n` separators.
    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }

    /// Inserts `content` as a new line at the end of the section headed by
    /// `target_header`.
    ///
    /// The target section is the first line whose trimmed text equals the
    /// trimmed `target_header`. It ends before the next header whose level is
    /// less than or equal to the target level, or at the end of the document.
    ///
    /// When no line matches, a blank line, the header, another blank line and
    /// the content are appended to the end of the document.
    pub fn insert_into_section(&mut self, target_header: &str, content: &str) -> SectionInsert {
        let level = target_level(target_header);
        let wanted = target_header.trim();

        let Some(header_index) = self.lines.iter().position(|line| line.trim() == wanted) else {
            self.lines.push(String::new());
            self.lines.push(target_header.to_string());
            self.lines.push(String::new());
            self.lines.push(content.to_string());
            return SectionInsert {
                section_found: false,
                line: self.lines.len() - 1,
            };
        };

        let insert_at = self.lines[header_index + 1..]
            .iter()
            .position(|line| header_level(line).is_some_and(|next| next <= level))
            .map_or(self.lines.len(), |offset| header_index + 1 + offset);

        self.lines.insert(insert_at, content.to_string());
        SectionInsert {
            section_found: true,
            line: insert_at,
        }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_text())
    }
}

/// Returns the level of a markdown header line (`#` run followed by
/// whitespace), or `None` if the line is not a header.
pub fn header_level(line: &str) -> Option<usize> {
    HEADER_RE.captures(line).map(|caps| caps[1].len())
}

/// Returns the section level implied by a target header string.
///
/// Counts leading `#` characters on the raw string. A header without any
/// is treated as level [`DEFAULT_SECTION_LEVEL`] rather than rejected.
pub fn target_level(target_header: &str) -> usize {
    match target_header.bytes().take_while(|b| *b == b'#').count() {
        0 => DEFAULT_SECTION_LEVEL,
        n => n,
    }
}
