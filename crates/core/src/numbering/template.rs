//! Sequence templates.
//!
//! A template is literal text with `{token}` or `{token:0Nd}` placeholders.
//! The token set is closed: `prefix`, `year`, `yy`, `month`, `day`, `seq`.
//! Only numeric tokens accept a width spec; `{{` and `}}` render literal braces.

use chrono::{Datelike, NaiveDate};

use super::error::SequenceFormatError;

/// Template used when a sequence row is first created, and as the fallback
/// for a stored template that no longer parses.
pub const DEFAULT_FORMAT: &str = "{prefix}-{month:02d}{yy:02d}-{seq:04d}";

/// Maximum stored template length.
pub const FORMAT_MAX_LEN: usize = 120;

/// Widest zero-padding accepted in a spec.
const MAX_WIDTH: usize = 18;

/// A template placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// Sequence prefix, rendered verbatim.
    Prefix,
    /// Four-digit year.
    Year,
    /// Year modulo 100.
    Yy,
    /// Month number (1-12).
    Month,
    /// Day of month.
    Day,
    /// The allocated counter value.
    Seq,
}

impl Token {
    /// Returns the placeholder name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Prefix => "prefix",
            Self::Year => "year",
            Self::Yy => "yy",
            Self::Month => "month",
            Self::Day => "day",
            Self::Seq => "seq",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "prefix" => Some(Self::Prefix),
            "year" => Some(Self::Year),
            "yy" => Some(Self::Yy),
            "month" => Some(Self::Month),
            "day" => Some(Self::Day),
            "seq" => Some(Self::Seq),
            _ => None,
        }
    }

    /// Numeric value for this token, or `None` for `prefix`.
    fn numeric_value(self, date: NaiveDate, seq: i64) -> Option<i64> {
        match self {
            Self::Prefix => None,
            Self::Year => Some(i64::from(date.year())),
            Self::Yy => Some(i64::from(date.year() % 100)),
            Self::Month => Some(i64::from(date.month())),
            Self::Day => Some(i64::from(date.day())),
            Self::Seq => Some(seq),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field { token: Token, width: Option<usize> },
}

/// Values substituted into a template.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// Sequence prefix.
    pub prefix: &'a str,
    /// Allocation date.
    pub date: NaiveDate,
    /// Counter value.
    pub seq: i64,
    /// Zero-padding for a bare `{seq}`.
    pub padding: usize,
}

/// A parsed and validated sequence template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl SequenceTemplate {
    /// Parses and validates a template.
    ///
    /// # Errors
    ///
    /// Returns `SequenceFormatError` for an empty or overlong template,
    /// unbalanced braces, an unknown token, a width spec on `prefix` or any
    /// spec other than `d`/`0Nd`, or a template without `{seq}`.
    pub fn parse(source: &str) -> Result<Self, SequenceFormatError> {
        if source.is_empty() {
            return Err(SequenceFormatError::Empty);
        }
        if source.chars().count() > FORMAT_MAX_LEN {
            return Err(SequenceFormatError::TooLong(FORMAT_MAX_LEN));
        }

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.char_indices().peekable();

        while let Some((pos, c)) = chars.next() {
            let doubled = chars.peek().is_some_and(|&(_, next)| next == c);
            match c {
                '{' | '}' if doubled => {
                    chars.next();
                    literal.push(c);
                }
                '{' => {
                    let mut body = String::new();
                    let mut closed = false;
                    for (_, next) in chars.by_ref() {
                        match next {
                            '}' => {
                                closed = true;
                                break;
                            }
                            '{' => return Err(SequenceFormatError::UnbalancedBraces(pos)),
                            _ => body.push(next),
                        }
                    }
                    if !closed {
                        return Err(SequenceFormatError::UnbalancedBraces(pos));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Self::parse_field(&body)?);
                }
                '}' => return Err(SequenceFormatError::UnbalancedBraces(pos)),
                _ => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        let has_seq = segments
            .iter()
            .any(|s| matches!(s, Segment::Field { token: Token::Seq, .. }));
        if !has_seq {
            return Err(SequenceFormatError::MissingSeq);
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// The built-in `{prefix}-{month:02d}{yy:02d}-{seq:04d}` template.
    #[must_use]
    pub fn default_template() -> Self {
        Self {
            source: DEFAULT_FORMAT.to_string(),
            segments: vec![
                Segment::Field {
                    token: Token::Prefix,
                    width: None,
                },
                Segment::Literal("-".to_string()),
                Segment::Field {
                    token: Token::Month,
                    width: Some(2),
                },
                Segment::Field {
                    token: Token::Yy,
                    width: Some(2),
                },
                Segment::Literal("-".to_string()),
                Segment::Field {
                    token: Token::Seq,
                    width: Some(4),
                },
            ],
        }
    }

    fn parse_field(body: &str) -> Result<Segment, SequenceFormatError> {
        let (name, spec) = match body.split_once(':') {
            Some((name, spec)) => (name, Some(spec)),
            None => (body, None),
        };
        let token =
            Token::from_name(name).ok_or_else(|| SequenceFormatError::UnknownToken(name.to_string()))?;
        let width = spec.map(|spec| Self::parse_width(token, spec)).transpose()?;
        Ok(Segment::Field { token, width })
    }

    /// Accepts `d` or `0Nd`.
    fn parse_width(token: Token, spec: &str) -> Result<usize, SequenceFormatError> {
        let invalid = || SequenceFormatError::InvalidSpec {
            token: token.name().to_string(),
            spec: spec.to_string(),
        };

        if token == Token::Prefix {
            return Err(invalid());
        }
        let digits = spec.strip_suffix('d').ok_or_else(invalid)?;
        if digits.is_empty() {
            return Ok(0);
        }
        let digits = digits.strip_prefix('0').ok_or_else(invalid)?;
        if digits.is_empty() {
            return Ok(0);
        }
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let width: usize = digits.parse().map_err(|_| invalid())?;
        if width > MAX_WIDTH {
            return Err(invalid());
        }
        Ok(width)
    }

    /// Returns the template text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns true if `{seq}` carries its own width, so the row padding is ignored.
    #[must_use]
    pub fn has_seq_width(&self) -> bool {
        self.segments.iter().any(|s| {
            matches!(
                s,
                Segment::Field {
                    token: Token::Seq,
                    width: Some(_)
                }
            )
        })
    }

    /// Renders the template.
    #[must_use]
    pub fn render(&self, ctx: &RenderContext<'_>) -> String {
        let mut out = String::with_capacity(self.source.len() + ctx.prefix.len());

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field { token, width } => match token.numeric_value(ctx.date, ctx.seq) {
                    None => out.push_str(ctx.prefix),
                    Some(value) => {
                        let bare = if *token == Token::Seq { ctx.padding } else { 0 };
                        let width = width.unwrap_or(bare);
                        out.push_str(&format!("{value:0width$}"));
                    }
                },
            }
        }

        out
    }
}

impl std::fmt::Display for SequenceTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}
