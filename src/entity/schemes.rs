/**
This module gives the tooling necessary to parse a sequence of tags into a list of spans. Every
supported tagging format is a variant of the closed `TaggingFormat` enum, which maps to a table of
prefixes. A single state machine, `SpanLoader`, walks the tags with the help of that table.
*/
use crate::entity::{InvalidRangeError, Span};
use enum_iterator::Sequence;
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr, sync::Arc};
use thiserror::Error;

/// The only tag that is never attached to a span.
pub(crate) const OUTSIDE_TAG: &str = "O";

/// Tagging formats supported by the loaders. The letters of a format are the prefixes its tags
/// can carry.
///
/// * IOB: `I` is a token inside a span and `B` begins a span immediately following another span.
///     An `I` without a preceding span opens one.
/// * IOB2: Same as IOB, except that every span must begin with `B`.
/// * BIOES: Every span either begins with `B` and closes with `E`, or is a single `S` token.
/// * BILOU: Same as BIOES, with `L` (last) and `U` (unit) instead of `E` and `S`.
#[derive(
    Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Sequence, Serialize, Deserialize,
)]
pub enum TaggingFormat {
    IOB,
    IOB2,
    BIOES,
    BILOU,
}

impl Display for TaggingFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Error)]
#[error("Impossible to parse the string ({0}) into a TaggingFormat")]
pub struct FormatParsingError(String);

impl FromStr for TaggingFormat {
    type Err = FormatParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "iob" | "iob1" => Ok(TaggingFormat::IOB),
            "iob2" => Ok(TaggingFormat::IOB2),
            "bioes" | "iobes" => Ok(TaggingFormat::BIOES),
            "bilou" => Ok(TaggingFormat::BILOU),
            _ => Err(FormatParsingError(String::from(s))),
        }
    }
}

impl TaggingFormat {
    /// Prefix table of the format. The match is exhaustive: every format has exactly one table.
    pub(crate) const fn prefix_table(self) -> PrefixTable {
        match self {
            TaggingFormat::IOB => PrefixTable {
                start: UserPrefix::B,
                inside: UserPrefix::I,
                end: None,
                single: None,
                inside_opens_span: true,
            },
            TaggingFormat::IOB2 => PrefixTable {
                start: UserPrefix::B,
                inside: UserPrefix::I,
                end: None,
                single: None,
                inside_opens_span: false,
            },
            TaggingFormat::BIOES => PrefixTable {
                start: UserPrefix::B,
                inside: UserPrefix::I,
                end: Some(UserPrefix::E),
                single: Some(UserPrefix::S),
                inside_opens_span: false,
            },
            TaggingFormat::BILOU => PrefixTable {
                start: UserPrefix::B,
                inside: UserPrefix::I,
                end: Some(UserPrefix::L),
                single: Some(UserPrefix::U),
                inside_opens_span: false,
            },
        }
    }

    /// Loader for this format, without context padding and with the prefix in front of the tags.
    pub fn loader(self) -> SpanLoader {
        SpanLoader::new(self)
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
/// The prefixes that can be supplied by the user. All of them are a single char.
pub(crate) enum UserPrefix {
    I,
    O,
    B,
    E,
    S,
    U,
    L,
}

impl TryFrom<char> for UserPrefix {
    type Error = char;
    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value {
            'I' => Ok(Self::I),
            'O' => Ok(Self::O),
            'B' => Ok(Self::B),
            'E' => Ok(Self::E),
            'S' => Ok(Self::S),
            'U' => Ok(Self::U),
            'L' => Ok(Self::L),
            c => Err(c),
        }
    }
}

/// Role of each prefix for a given format. The end and single prefixes only exist in formats
/// where spans are closed explicitly.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub(crate) struct PrefixTable {
    start: UserPrefix,
    inside: UserPrefix,
    end: Option<UserPrefix>,
    single: Option<UserPrefix>,
    inside_opens_span: bool,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum TagRole {
    Outside,
    Start,
    Inside,
    End,
    Single,
}

impl PrefixTable {
    fn role_of(&self, prefix: UserPrefix) -> Option<TagRole> {
        match prefix {
            UserPrefix::O => Some(TagRole::Outside),
            p if p == self.start => Some(TagRole::Start),
            p if p == self.inside => Some(TagRole::Inside),
            p if Some(p) == self.end => Some(TagRole::End),
            p if Some(p) == self.single => Some(TagRole::Single),
            _ => None,
        }
    }

    /// In explicit formats, only an end or single prefix may close a span.
    fn closes_explicitly(&self) -> bool {
        self.end.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Errors encountered while converting a sequence of tags into spans.
pub enum ParsingError {
    #[error("Number of tokens and tags is not the same. Got {tokens} tokens and {tags} tags.")]
    InconsistentLength { tokens: usize, tags: usize },
    #[error("Tag length too short cannot extract a prefix from the tag \"{tag}\" at idx: {idx}.")]
    TagTooShort { tag: String, idx: usize },
    #[error("Unknown Token Tag: \"{tag}\" with prefix label: \"{prefix}\" at idx: {idx}.")]
    UnknownTag {
        tag: String,
        prefix: char,
        idx: usize,
    },
    #[error("Tokens with different labels found within the same span for idx range ({start}, {stop}).")]
    DifferentLabelsInSpan { start: usize, stop: usize },
    #[error("Encountered inside tag before a start tag at idx: {idx}.")]
    InsideBeforeStart { idx: usize },
    #[error("Encountered end tag before a start tag at idx: {idx}.")]
    EndBeforeStart { idx: usize },
    #[error("Encountered outside tag before the open span was closed at idx: {idx}.")]
    OutsideBeforeEnd { idx: usize },
    #[error("Encountered start tag before the open span was closed at idx: {idx}.")]
    StartBeforeEnd { idx: usize },
    #[error("Encountered single tag before the open span was closed at idx: {idx}.")]
    SingleBeforeEnd { idx: usize },
    #[error("Tag list ended before the span starting at idx: {start} was closed.")]
    UnclosedSpan { start: usize },
    #[error(transparent)]
    InvalidRange(#[from] InvalidRangeError),
}

/// Span under construction while scanning the tags.
struct OpenSpan<'t> {
    start: usize,
    label: &'t str,
    mixed_labels: bool,
}

impl<'t> OpenSpan<'t> {
    fn new(start: usize, label: &'t str) -> Self {
        OpenSpan {
            start,
            label,
            mixed_labels: false,
        }
    }

    fn extend(mut self, label: &str) -> Self {
        self.mixed_labels |= self.label != label;
        self
    }
}

/// Converts a sequence of tags (and optionally its tokens) into spans for a given format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpanLoader {
    format: TaggingFormat,
    context_padding: usize,
    suffix: bool,
}

impl SpanLoader {
    pub fn new(format: TaggingFormat) -> Self {
        SpanLoader {
            format,
            context_padding: 0,
            suffix: false,
        }
    }

    /// Number of tokens kept on each side of a span in its context.
    pub fn with_context_padding(mut self, context_padding: usize) -> Self {
        self.context_padding = context_padding;
        self
    }

    /// Is the prefix located at the end of the tags (e.g. `PER-B`)?
    pub fn with_suffix(mut self, suffix: bool) -> Self {
        self.suffix = suffix;
        self
    }

    pub fn format(&self) -> TaggingFormat {
        self.format
    }

    /// Retrieves the spans of a tagged sequence. Every span carries the tokens it covers and its
    /// padded context.
    ///
    /// * `tokens`: Tokens of the sequence.
    /// * `tags`: One tag per token.
    pub fn retrieve_spans<T, G>(&self, tokens: &[T], tags: &[G]) -> Result<Vec<Span>, ParsingError>
    where
        T: AsRef<str>,
        G: AsRef<str>,
    {
        if tokens.len() != tags.len() {
            return Err(ParsingError::InconsistentLength {
                tokens: tokens.len(),
                tags: tags.len(),
            });
        }
        self.scan(Some(tokens), tags)
    }

    /// Retrieves the spans of a tagged sequence without attaching any token payload.
    pub fn retrieve_spans_from_tags<G: AsRef<str>>(
        &self,
        tags: &[G],
    ) -> Result<Vec<Span>, ParsingError> {
        self.scan::<&str, G>(None, tags)
    }

    fn scan<T, G>(&self, tokens: Option<&[T]>, tags: &[G]) -> Result<Vec<Span>, ParsingError>
    where
        T: AsRef<str>,
        G: AsRef<str>,
    {
        let table = self.format.prefix_table();
        let explicit = table.closes_explicitly();
        let mut spans = Vec::new();
        let mut open: Option<OpenSpan> = None;
        for (idx, tag) in tags.iter().enumerate() {
            let (role, label) = self.classify(tag.as_ref(), idx, &table)?;
            open = match (role, open.take()) {
                (TagRole::Outside, None) => None,
                (TagRole::Outside, Some(_)) if explicit => {
                    return Err(ParsingError::OutsideBeforeEnd { idx })
                }
                (TagRole::Outside, Some(span)) => {
                    spans.push(self.close(span, idx, tokens)?);
                    None
                }
                (TagRole::Start, Some(_)) if explicit => {
                    return Err(ParsingError::StartBeforeEnd { idx })
                }
                (TagRole::Start, Some(span)) => {
                    spans.push(self.close(span, idx, tokens)?);
                    Some(OpenSpan::new(idx, label))
                }
                (TagRole::Start, None) => Some(OpenSpan::new(idx, label)),
                (TagRole::Inside, Some(span)) => Some(span.extend(label)),
                (TagRole::Inside, None) if table.inside_opens_span => {
                    Some(OpenSpan::new(idx, label))
                }
                (TagRole::Inside, None) => return Err(ParsingError::InsideBeforeStart { idx }),
                (TagRole::End, Some(span)) => {
                    spans.push(self.close(span.extend(label), idx + 1, tokens)?);
                    None
                }
                (TagRole::End, None) => return Err(ParsingError::EndBeforeStart { idx }),
                (TagRole::Single, Some(_)) => return Err(ParsingError::SingleBeforeEnd { idx }),
                (TagRole::Single, None) => {
                    spans.push(self.close(OpenSpan::new(idx, label), idx + 1, tokens)?);
                    None
                }
            };
        }
        if let Some(span) = open {
            if explicit {
                return Err(ParsingError::UnclosedSpan { start: span.start });
            }
            spans.push(self.close(span, tags.len(), tokens)?);
        }
        Ok(spans)
    }

    /// Splits a tag into its role and its label. The label of an outside tag is empty.
    fn classify<'t>(
        &self,
        tag: &'t str,
        idx: usize,
        table: &PrefixTable,
    ) -> Result<(TagRole, &'t str), ParsingError> {
        if tag == OUTSIDE_TAG {
            return Ok((TagRole::Outside, ""));
        }
        let too_short = || ParsingError::TagTooShort {
            tag: String::from(tag),
            idx,
        };
        let mut chars = tag.chars();
        let prefix = if self.suffix {
            let prefix = chars.next_back().ok_or_else(too_short)?;
            chars.next_back().ok_or_else(too_short)?;
            prefix
        } else {
            let prefix = chars.next().ok_or_else(too_short)?;
            chars.next().ok_or_else(too_short)?;
            prefix
        };
        let label = chars.as_str();
        if label.is_empty() {
            return Err(too_short());
        }
        let unknown = |prefix| ParsingError::UnknownTag {
            tag: String::from(tag),
            prefix,
            idx,
        };
        let user_prefix = UserPrefix::try_from(prefix).map_err(unknown)?;
        let role = table.role_of(user_prefix).ok_or_else(|| unknown(prefix))?;
        Ok((role, label))
    }

    /// Closes the span covering the tokens in `[span.start, stop)`.
    fn close<T: AsRef<str>>(
        &self,
        span: OpenSpan,
        stop: usize,
        tokens: Option<&[T]>,
    ) -> Result<Span, ParsingError> {
        if span.mixed_labels {
            return Err(ParsingError::DifferentLabelsInSpan {
                start: span.start,
                stop,
            });
        }
        let closed = Span::new(span.label, span.start, stop - 1)?;
        let Some(tokens) = tokens else {
            return Ok(closed);
        };
        let context_start = span.start.saturating_sub(self.context_padding);
        let context_stop = stop.saturating_add(self.context_padding).min(tokens.len());
        let spanned: Arc<[String]> = tokens[span.start..stop]
            .iter()
            .map(|t| String::from(t.as_ref()))
            .collect();
        let context: Arc<[String]> = tokens[context_start..context_stop]
            .iter()
            .map(|t| String::from(t.as_ref()))
            .collect();
        Ok(closed.with_tokens(spanned).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::tests::span;
    use rstest::rstest;

    fn tokens_for(tags: &[&str]) -> Vec<String> {
        (0..tags.len()).map(|i| format!("tok{i}")).collect()
    }

    #[rstest]
    #[case(TaggingFormat::IOB, vec!["I-PER", "I-PER", "O", "O", "I-LOC", "I-LOC"], vec![("PER", 0, 1), ("LOC", 4, 5)])]
    #[case(TaggingFormat::IOB, vec!["I-PER", "B-PER", "O"], vec![("PER", 0, 0), ("PER", 1, 1)])]
    #[case(TaggingFormat::IOB, vec!["O", "I-PER", "I-PER"], vec![("PER", 1, 2)])]
    #[case(TaggingFormat::IOB2, vec!["B-PER", "I-PER", "O", "B-LOC"], vec![("PER", 0, 1), ("LOC", 3, 3)])]
    #[case(TaggingFormat::IOB2, vec!["B-PER", "B-PER", "I-PER"], vec![("PER", 0, 0), ("PER", 1, 2)])]
    #[case(TaggingFormat::IOB2, vec!["O", "O"], vec![])]
    #[case(TaggingFormat::BIOES, vec!["B-PER", "I-PER", "E-PER", "O", "S-LOC"], vec![("PER", 0, 2), ("LOC", 4, 4)])]
    #[case(TaggingFormat::BIOES, vec!["S-PER", "S-LOC", "B-MISC", "E-MISC"], vec![("PER", 0, 0), ("LOC", 1, 1), ("MISC", 2, 3)])]
    #[case(TaggingFormat::BILOU, vec!["U-PER", "B-LOC", "L-LOC"], vec![("PER", 0, 0), ("LOC", 1, 2)])]
    #[case(TaggingFormat::BILOU, vec!["O", "B-ORG", "I-ORG", "I-ORG", "L-ORG", "O"], vec![("ORG", 1, 4)])]
    fn test_retrieve_spans(
        #[case] format: TaggingFormat,
        #[case] tags: Vec<&str>,
        #[case] expected: Vec<(&str, usize, usize)>,
    ) {
        let tokens = tokens_for(&tags);
        let actual = format.loader().retrieve_spans(&tokens, &tags).unwrap();
        let expected: Vec<Span> = expected
            .into_iter()
            .map(|(t, s, e)| span(t, s, e))
            .collect();
        assert_eq!(actual, expected);
    }

    #[rstest]
    #[case(TaggingFormat::IOB2, vec!["O", "I-PER"], ParsingError::InsideBeforeStart { idx: 1 })]
    #[case(TaggingFormat::BIOES, vec!["B-PER", "O"], ParsingError::OutsideBeforeEnd { idx: 1 })]
    #[case(TaggingFormat::BIOES, vec!["O", "B-PER", "I-PER"], ParsingError::UnclosedSpan { start: 1 })]
    #[case(TaggingFormat::BIOES, vec!["E-PER"], ParsingError::EndBeforeStart { idx: 0 })]
    #[case(TaggingFormat::BIOES, vec!["B-PER", "S-LOC"], ParsingError::SingleBeforeEnd { idx: 1 })]
    #[case(TaggingFormat::BILOU, vec!["B-PER", "B-PER"], ParsingError::StartBeforeEnd { idx: 1 })]
    #[case(TaggingFormat::BILOU, vec!["I-PER"], ParsingError::InsideBeforeStart { idx: 0 })]
    #[case(TaggingFormat::BILOU, vec!["B-PER", "E-PER"], ParsingError::UnknownTag { tag: String::from("E-PER"), prefix: 'E', idx: 1 })]
    #[case(TaggingFormat::IOB2, vec!["O", "Z-LOC"], ParsingError::UnknownTag { tag: String::from("Z-LOC"), prefix: 'Z', idx: 1 })]
    #[case(TaggingFormat::IOB, vec!["O", "Z-"], ParsingError::TagTooShort { tag: String::from("Z-"), idx: 1 })]
    #[case(TaggingFormat::IOB2, vec!["O", "B-PER", "I-LOC", "O"], ParsingError::DifferentLabelsInSpan { start: 1, stop: 3 })]
    #[case(TaggingFormat::BIOES, vec!["B-PER", "E-LOC"], ParsingError::DifferentLabelsInSpan { start: 0, stop: 2 })]
    fn test_retrieve_spans_errors(
        #[case] format: TaggingFormat,
        #[case] tags: Vec<&str>,
        #[case] expected: ParsingError,
    ) {
        let tokens = tokens_for(&tags);
        let actual = format.loader().retrieve_spans(&tokens, &tags).unwrap_err();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_error_messages() {
        let err = ParsingError::TagTooShort {
            tag: String::from("Z-"),
            idx: 1,
        };
        assert_eq!(
            err.to_string(),
            "Tag length too short cannot extract a prefix from the tag \"Z-\" at idx: 1."
        );
        let err = ParsingError::UnknownTag {
            tag: String::from("Z-LOC"),
            prefix: 'Z',
            idx: 7,
        };
        assert_eq!(
            err.to_string(),
            "Unknown Token Tag: \"Z-LOC\" with prefix label: \"Z\" at idx: 7."
        );
        let err = ParsingError::DifferentLabelsInSpan { start: 4, stop: 7 };
        assert_eq!(
            err.to_string(),
            "Tokens with different labels found within the same span for idx range (4, 7)."
        );
    }

    #[test]
    fn test_inconsistent_length() {
        let tokens = vec!["John", "Doe"];
        let tags = vec!["B-PER"];
        let actual = TaggingFormat::IOB2
            .loader()
            .retrieve_spans(&tokens, &tags)
            .unwrap_err();
        assert_eq!(
            actual,
            ParsingError::InconsistentLength { tokens: 2, tags: 1 }
        );
    }

    #[rstest]
    #[case(0, vec!["c"])]
    #[case(1, vec!["b", "c", "d"])]
    #[case(5, vec!["a", "b", "c", "d", "e"])]
    fn test_context_padding(#[case] padding: usize, #[case] expected: Vec<&str>) {
        let tokens = vec!["a", "b", "c", "d", "e"];
        let tags = vec!["O", "O", "B-X", "O", "O"];
        let spans = TaggingFormat::IOB2
            .loader()
            .with_context_padding(padding)
            .retrieve_spans(&tokens, &tags)
            .unwrap();
        assert_eq!(spans.len(), 1);
        let expected: Vec<String> = expected.into_iter().map(String::from).collect();
        assert_eq!(spans[0].span_context().unwrap(), expected.as_slice());
        assert_eq!(spans[0].spanned_tokens().unwrap(), &[String::from("c")]);
    }

    #[test]
    fn test_suffix() {
        let tags = vec!["PER-B", "PER-I", "O", "LOC-S"];
        let actual = TaggingFormat::BIOES
            .loader()
            .with_suffix(true)
            .retrieve_spans_from_tags(&tags);
        // `PER` is never closed by an end tag.
        assert_eq!(
            actual.unwrap_err(),
            ParsingError::OutsideBeforeEnd { idx: 2 }
        );
        let tags = vec!["PER-B", "PER-I", "O", "LOC-B"];
        let actual = TaggingFormat::IOB2
            .loader()
            .with_suffix(true)
            .retrieve_spans_from_tags(&tags)
            .unwrap();
        assert_eq!(actual, vec![span("PER", 0, 1), span("LOC", 3, 3)]);
        assert!(actual[0].spanned_tokens().is_none());
    }

    #[rstest]
    #[case("iob", TaggingFormat::IOB)]
    #[case("IOB2", TaggingFormat::IOB2)]
    #[case("iobes", TaggingFormat::BIOES)]
    #[case("BIOES", TaggingFormat::BIOES)]
    #[case("Bilou", TaggingFormat::BILOU)]
    fn test_format_from_str(#[case] input: &str, #[case] expected: TaggingFormat) {
        assert_eq!(TaggingFormat::from_str(input).unwrap(), expected);
    }

    #[test]
    fn test_every_format_has_its_own_table() {
        let tables: Vec<PrefixTable> = enum_iterator::all::<TaggingFormat>()
            .map(TaggingFormat::prefix_table)
            .collect();
        for (i, a) in tables.iter().enumerate() {
            for b in tables.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
        assert!(TaggingFormat::from_str("IOE2").is_err());
    }
}
