//! Line-level model of `.env` content.
//!
//! An [`EnvDocument`] borrows the bytes it was parsed from and keeps every
//! line terminator, so writing an unmodified document reproduces the input
//! byte for byte.

use std::borrow::Cow;

/// Terminator that followed a line in the source bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    /// `\n`
    Lf,
    /// `\r\n`
    CrLf,
    /// Last line of content without a trailing newline.
    None,
}

impl LineEnding {
    /// Bytes of the terminator.
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            Self::Lf => b"\n",
            Self::CrLf => b"\r\n",
            Self::None => b"",
        }
    }
}

/// A `KEY=VALUE` line split at its first `=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment<'a> {
    key_part: &'a [u8],
    value: &'a [u8],
}

impl<'a> Assignment<'a> {
    /// Everything up to and including the first `=`, untouched.
    pub fn key_part(&self) -> &'a [u8] {
        self.key_part
    }

    /// Everything after the first `=`, untouched.
    pub fn value(&self) -> &'a [u8] {
        self.value
    }

    /// Variable name: the key part without `=`, surrounding whitespace
    /// and a leading `export ` keyword.
    pub fn name(&self) -> Cow<'a, str> {
        let key = &self.key_part[..self.key_part.len() - 1];
        let key = key.trim_ascii();
        let key = match key.strip_prefix(b"export") {
            Some(rest) if rest.first().is_some_and(|b| b.is_ascii_whitespace()) => {
                rest.trim_ascii_start()
            }
            _ => key,
        };
        String::from_utf8_lossy(key)
    }
}

/// Classification of a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// Empty or whitespace-only.
    Blank(&'a [u8]),
    /// First non-whitespace character is `#`.
    Comment(&'a [u8]),
    /// Contains an `=`.
    Assignment(Assignment<'a>),
    /// Anything else; passed through verbatim.
    Unparseable(&'a [u8]),
}

/// One line of a document together with its terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    kind: LineKind<'a>,
    ending: LineEnding,
}

impl<'a> Line<'a> {
    /// Classify the text of one line (without its terminator).
    ///
    /// Classification looks at the trimmed text; the stored slices are the
    /// original bytes.
    pub fn classify(text: &'a [u8], ending: LineEnding) -> Self {
        let trimmed = text.trim_ascii();
        let kind = if trimmed.is_empty() {
            LineKind::Blank(text)
        } else if trimmed.starts_with(b"#") {
            LineKind::Comment(text)
        } else {
            match text.iter().position(|&b| b == b'=') {
                Some(pos) => LineKind::Assignment(Assignment {
                    key_part: &text[..=pos],
                    value: &text[pos + 1..],
                }),
                None => LineKind::Unparseable(text),
            }
        };
        Self { kind, ending }
    }

    pub fn kind(&self) -> &LineKind<'a> {
        &self.kind
    }

    pub fn ending(&self) -> LineEnding {
        self.ending
    }

    /// Append the line and its terminator, unchanged, to `out`.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        match self.kind {
            LineKind::Blank(text) | LineKind::Comment(text) | LineKind::Unparseable(text) => {
                out.extend_from_slice(text);
            }
            LineKind::Assignment(assignment) => {
                out.extend_from_slice(assignment.key_part);
                out.extend_from_slice(assignment.value);
            }
        }
        out.extend_from_slice(self.ending.as_bytes());
    }
}

/// Ordered lines of a `.env` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvDocument<'a> {
    lines: Vec<Line<'a>>,
}

impl<'a> EnvDocument<'a> {
    /// Split content into classified lines.
    ///
    /// Never fails: lines that are not assignments, comments or blanks
    /// become `Unparseable`.
    pub fn parse(content: &'a [u8]) -> Self {
        let lines = content
            .split_inclusive(|&b| b == b'\n')
            .map(|segment| {
                if let Some(text) = segment.strip_suffix(b"\r\n") {
                    Line::classify(text, LineEnding::CrLf)
                } else if let Some(text) = segment.strip_suffix(b"\n") {
                    Line::classify(text, LineEnding::Lf)
                } else {
                    Line::classify(segment, LineEnding::None)
                }
            })
            .collect();
        Self { lines }
    }

    pub fn lines(&self) -> &[Line<'a>] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Assignment lines in document order.
    pub fn assignments(&self) -> impl Iterator<Item = &Assignment<'a>> + '_ {
        self.lines.iter().filter_map(|line| match &line.kind {
            LineKind::Assignment(assignment) => Some(assignment),
            _ => None,
        })
    }

    /// Re-serialize the document.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for line in &self.lines {
            line.write_to(&mut out);
        }
        out
    }
}
