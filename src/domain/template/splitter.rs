// Splits template text into `/`-delimited segments
//
// Brackets (`{}`, `()`, `[]`) and quotes (`'`, `"`) are transparent to the
// delimiter, and a backslash escapes the next character inside them. Brackets
// nest inside brackets; inside quotes nothing nests.

use crate::error::ParseError;

/// One piece of a segment, in source order
#[derive(Debug, Clone, PartialEq)]
pub enum Piece {
    Literal { text: String, start: usize },
    /// `inner` is the raw text between the brackets, escapes untouched
    Bracketed { open: char, inner: String, start: usize },
    /// `text` has the quotes removed and escapes resolved
    Quoted { quote: char, text: String, start: usize },
}

impl Piece {
    pub fn start(&self) -> usize {
        match self {
            Piece::Literal { start, .. }
            | Piece::Bracketed { start, .. }
            | Piece::Quoted { start, .. } => *start,
        }
    }

    /// The piece as it appeared in the source (escapes inside quotes resolved)
    pub fn literal_text(&self) -> String {
        match self {
            Piece::Literal { text, .. } | Piece::Quoted { text, .. } => text.clone(),
            Piece::Bracketed { open, inner, .. } => {
                format!("{}{}{}", open, inner, closer_for(*open).unwrap_or(*open))
            }
        }
    }
}

/// A template segment with its decomposition
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub text: String,
    pub start: usize,
    pub pieces: Vec<Piece>,
}

pub struct SegmentSplitter<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> SegmentSplitter<'a> {
    /// Splits template text, ignoring empty leading/trailing segments and
    /// rejecting empty inner ones
    pub fn split(input: &'a str) -> Result<Vec<Segment>, ParseError> {
        let mut splitter = Self { input, pos: 0 };
        let mut segments = Vec::new();
        loop {
            segments.push(splitter.parse_segment()?);
            if splitter.peek_char() == Some('/') {
                splitter.pos += 1;
            } else {
                break;
            }
        }

        if segments.first().is_some_and(|s| s.text.is_empty()) {
            segments.remove(0);
        }
        if segments.last().is_some_and(|s| s.text.is_empty()) {
            segments.pop();
        }
        if let Some(empty) = segments.iter().find(|s| s.text.is_empty()) {
            return Err(ParseError::new("path parts cannot be empty", empty.start));
        }
        Ok(segments)
    }

    fn parse_segment(&mut self) -> Result<Segment, ParseError> {
        let start = self.pos;
        let mut pieces = Vec::new();
        let mut literal_buf = String::new();
        let mut literal_start = start;

        while let Some(ch) = self.peek_char() {
            match ch {
                '/' => break,
                '{' | '(' | '[' => {
                    flush_literal(&mut pieces, &mut literal_buf, literal_start);
                    pieces.push(self.parse_bracketed()?);
                    literal_start = self.pos;
                }
                '}' | ')' | ']' => {
                    return Err(ParseError::new(format!("unopened '{}'", ch), self.pos));
                }
                '\'' | '"' => {
                    flush_literal(&mut pieces, &mut literal_buf, literal_start);
                    pieces.push(self.parse_quoted()?);
                    literal_start = self.pos;
                }
                _ => {
                    if literal_buf.is_empty() {
                        literal_start = self.pos;
                    }
                    literal_buf.push(self.consume_char()?);
                }
            }
        }
        flush_literal(&mut pieces, &mut literal_buf, literal_start);

        Ok(Segment {
            text: self.input[start..self.pos].to_string(),
            start,
            pieces,
        })
    }

    fn parse_bracketed(&mut self) -> Result<Piece, ParseError> {
        let start = self.pos;
        let open = self.consume_char()?;
        let mut expected: Vec<(char, usize)> = Vec::new();
        if let Some(close) = closer_for(open) {
            expected.push((close, start));
        }

        while let Some((close, _)) = expected.last().copied() {
            let ch = self
                .peek_char()
                .ok_or_else(|| unclosed(&expected))?;
            match ch {
                '\\' => {
                    self.consume_char()?;
                    if self.peek_char().is_none() {
                        return Err(unclosed(&expected));
                    }
                    self.consume_char()?;
                }
                c if c == close => {
                    self.consume_char()?;
                    expected.pop();
                }
                c if closer_for(c).is_some() => {
                    if let Some(inner_close) = closer_for(c) {
                        expected.push((inner_close, self.pos));
                    }
                    self.consume_char()?;
                }
                '}' | ')' | ']' => {
                    return Err(ParseError::new(format!("unexpected '{}'", ch), self.pos));
                }
                _ => {
                    self.consume_char()?;
                }
            }
        }

        let inner_start = start + open.len_utf8();
        let inner_end = self.pos - 1;
        Ok(Piece::Bracketed {
            open,
            inner: self.input[inner_start..inner_end].to_string(),
            start,
        })
    }

    fn parse_quoted(&mut self) -> Result<Piece, ParseError> {
        let start = self.pos;
        let quote = self.consume_char()?;
        let mut text = String::new();

        loop {
            match self.peek_char() {
                None => {
                    return Err(ParseError::new(format!("unclosed {}", quote), start));
                }
                Some('\\') => {
                    self.consume_char()?;
                    match self.peek_char() {
                        Some(_) => text.push(self.consume_char()?),
                        None => return Err(ParseError::new(format!("unclosed {}", quote), start)),
                    }
                }
                Some(c) if c == quote => {
                    self.consume_char()?;
                    break;
                }
                Some(_) => text.push(self.consume_char()?),
            }
        }

        Ok(Piece::Quoted { quote, text, start })
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn consume_char(&mut self) -> Result<char, ParseError> {
        let ch = self
            .peek_char()
            .ok_or_else(|| ParseError::new("unexpected end of input", self.pos))?;
        self.pos += ch.len_utf8();
        Ok(ch)
    }
}

/// Splits a live path on `/`, ignoring empty leading/trailing segments
///
/// Returns `None` when an inner segment is empty (`//`).
pub fn split_path(path: &str) -> Option<Vec<&str>> {
    let mut parts: Vec<&str> = path.split('/').collect();
    if parts.first() == Some(&"") {
        parts.remove(0);
    }
    if parts.last() == Some(&"") {
        parts.pop();
    }
    if parts.iter().any(|p| p.is_empty()) {
        return None;
    }
    Some(parts)
}

fn closer_for(open: char) -> Option<char> {
    match open {
        '{' => Some('}'),
        '(' => Some(')'),
        '[' => Some(']'),
        _ => None,
    }
}

fn unclosed(expected: &[(char, usize)]) -> ParseError {
    match expected.last() {
        Some((close, pos)) => ParseError::new(format!("unclosed '{}'", opener_for(*close)), *pos),
        None => ParseError::new("unexpected end of input", 0),
    }
}

fn opener_for(close: char) -> char {
    match close {
        '}' => '{',
        ')' => '(',
        _ => '[',
    }
}

fn flush_literal(pieces: &mut Vec<Piece>, buf: &mut String, start: usize) {
    if !buf.is_empty() {
        pieces.push(Piece::Literal {
            text: std::mem::take(buf),
            start,
        });
    }
}
