use serde::{Deserialize, Serialize};
use std::{
    fmt::Display,
    hash::{Hash, Hasher},
    sync::Arc,
};
use thiserror::Error;

mod autodetect;
pub(crate) mod schemes;

// Re-exporting
pub use autodetect::AutoDetectError;
pub use schemes::{FormatParsingError, ParsingError, SpanLoader, TaggingFormat};

/// A span represents a named entity in a token sequence. It contains a start and an end (i.e. at
/// what index of the sequence does it start and end, both inclusive) and a type, which is the
/// associated entity class (such as `LOC`, `PER`, `MISC`, etc.). A span can optionally carry the
/// tokens it covers and the tokens around it. These payloads are *not* part of its identity: two
/// spans are equal when their types and indices are equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawSpan")]
pub struct Span {
    span_type: String,
    start: usize,
    end: usize,
    spanned_tokens: Option<Arc<[String]>>,
    span_context: Option<Arc<[String]>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Start IDX for a span cannot be > End IDX. Got start {start} and end {end}.")]
/// Error returned when building a span whose start index is greater than its end index.
pub struct InvalidRangeError {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// Builds a span without any token payload.
    ///
    /// * `span_type`: Class of the entity, e.g. `"PER"`.
    /// * `start`: Index of the first token of the span.
    /// * `end`: Index of the last token of the span (inclusive).
    pub fn new<S: Into<String>>(
        span_type: S,
        start: usize,
        end: usize,
    ) -> Result<Self, InvalidRangeError> {
        if start > end {
            return Err(InvalidRangeError { start, end });
        }
        Ok(Span {
            span_type: span_type.into(),
            start,
            end,
            spanned_tokens: None,
            span_context: None,
        })
    }

    /// Attaches the tokens covered by the span.
    pub fn with_tokens<T: Into<Arc<[String]>>>(mut self, tokens: T) -> Self {
        self.spanned_tokens = Some(tokens.into());
        self
    }

    /// Attaches the tokens surrounding the span (the span's own tokens included).
    pub fn with_context<T: Into<Arc<[String]>>>(mut self, context: T) -> Self {
        self.span_context = Some(context.into());
        self
    }

    pub fn span_type(&self) -> &str {
        &self.span_type
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn spanned_tokens(&self) -> Option<&[String]> {
        self.spanned_tokens.as_deref()
    }

    /// Context tokens of the span. Falls back on the spanned tokens when no context was given.
    pub fn span_context(&self) -> Option<&[String]> {
        self.span_context
            .as_deref()
            .or(self.spanned_tokens.as_deref())
    }

    /// Both spans cover exactly the same tokens, whatever their types.
    pub fn bounds_same_tokens_as(&self, other: &Span) -> bool {
        self.start == other.start && self.end == other.end
    }

    /// Both spans share at least one token.
    pub fn overlaps_with(&self, other: &Span) -> bool {
        self.start.max(other.start) <= self.end.min(other.end)
    }

    pub fn ends_after_end_of(&self, other: &Span) -> bool {
        self.end > other.end
    }

    pub fn starts_before_start_of(&self, other: &Span) -> bool {
        self.start < other.start
    }

    /// `self` lies entirely after `other`.
    pub fn starts_after_end_of(&self, other: &Span) -> bool {
        self.start > other.end
    }

    /// `self` lies entirely before `other`.
    pub fn ends_before_start_of(&self, other: &Span) -> bool {
        self.end < other.start
    }

    pub(crate) fn sort_key(&self) -> (usize, usize) {
        (self.start, self.end)
    }

    pub fn as_tuple(&self) -> (&str, usize, usize) {
        (&self.span_type, self.start, self.end)
    }
}

impl PartialEq for Span {
    fn eq(&self, other: &Self) -> bool {
        self.as_tuple() == other.as_tuple()
    }
}
impl Eq for Span {}

impl Hash for Span {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_tuple().hash(state)
    }
}

impl Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.span_type, self.start, self.end)
    }
}

/// Serialized form of a span. Deserialization goes through `Span::new` to keep the range
/// invariant.
#[derive(Deserialize)]
struct RawSpan {
    span_type: String,
    start: usize,
    end: usize,
    spanned_tokens: Option<Arc<[String]>>,
    span_context: Option<Arc<[String]>>,
}

impl TryFrom<RawSpan> for Span {
    type Error = InvalidRangeError;
    fn try_from(value: RawSpan) -> Result<Self, Self::Error> {
        let mut span = Span::new(value.span_type, value.start, value.end)?;
        span.spanned_tokens = value.spanned_tokens;
        span.span_context = value.span_context;
        Ok(span)
    }
}

/// A gold span and the predicted span it was compared against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GoldPredictedPair {
    pub gold: Span,
    pub predicted: Span,
}

impl GoldPredictedPair {
    pub fn new(gold: Span, predicted: Span) -> Self {
        GoldPredictedPair { gold, predicted }
    }
}

impl Display for GoldPredictedPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <-> {}", self.gold, self.predicted)
    }
}
