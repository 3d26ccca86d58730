/*!
This library evaluates named entity recognition at the span level. Gold and predicted spans are
aligned document by document and every pair is classified into one of six scenarios. The scenarios
are then scored under four matching schemes.

# MATCHING SCHEMES
* Strict: A predicted span is correct only if its type and bounds are both equal to the gold
    span's.
* Type: A predicted span is correct if it overlaps a gold span of the same type. Overlaps of the
    same type with different bounds count for half when computing precision and recall.
* Partial: The type is ignored. Equal bounds are correct and any other overlap is partial, which
    counts for half.
* Bounds: The type is ignored and only equal bounds are correct.

# SCENARIOS
* I: The type and the bounds match.
* II: A predicted span overlaps no gold span (spurious).
* III: A gold span is overlapped by no predicted span (missed).
* IV: The bounds match but the type differs.
* V: The spans overlap with different bounds and the type matches.
* VI: The spans overlap with different bounds and the type differs.

# TAGGING FORMATS
Spans can be given directly or loaded from tag sequences. The supported formats are:
* IOB2: A `B` tag starts every span, `I` tags continue it.
* IOB: Same as IOB2, except that a span may also begin with an `I` tag. A `B` tag is still
    required to start a span right after another one.
* BIOES: `B`, `I` and `E` tags for spans of at least two tokens, `S` for single token spans.
* BILOU: Same as BIOES, with `L` instead of `E` and `U` instead of `S`.

When no format is configured, it is detected from the gold tags with
`TaggingFormat::try_auto_detect`.

# Terminology
* A span is a typed range of token indices, both inclusive, such as `(PER, 3, 4)`.
* A span type, or class, is the entity we are interested in, such as 'LOC' for location or 'PER'
    for person. It can be anything, but must be represented by a string.
* A tag is a string containing a prefix and a span type, such as `B-PER`. The prefix indicates
    where we are in the current span.
* A scorecard holds the outcomes and the metrics of a single matching scheme.
*/

mod aggregator;
mod config;
mod entity;
mod evaluator;
mod metrics;
mod reporter;

// The public api starts here
pub use entity::{
    AutoDetectError, FormatParsingError, GoldPredictedPair, InvalidRangeError, ParsingError,
    Span, SpanLoader, TaggingFormat,
};

pub use metrics::{MatchScheme, MatchSchemeParsingError, ScoreCard, ScoreCardSummary};

pub use aggregator::{InconsistentAggregatorError, ResultAggregator, ResultSummary, Scenario};

pub use evaluator::{
    evaluate_tagged_document, CorpusEvaluator, DocumentEvaluator, DocumentResult,
    EvaluationError, InconsistentLengthError, SpanSource, TaggedCorpusEvaluator,
};

pub use reporter::{Average, AverageParsingError, ClassMetrics, Reporter};

pub use config::{DefaultEvalConfigBuilder, EvalConfig, EvalConfigBuilder};

/// Main entrypoint of the library. This function loads the spans of the gold and predicted tags,
/// aligns every document and returns the evaluated corpus. Instead of taking in the raw
/// parameters, this function takes an `EvalConfig` struct and uses sensible defaults.
///
/// * `tokens`: Tokens of every document
/// * `gold_tags`: Gold tags of every document, one per token
/// * `predicted_tags`: Predicted tags of every document, one per token
/// * `config`: Format, context padding, suffix and parallelism.
///
/// #Example
/// ```rust
/// use nereval::{evaluate_tagged_corpus_conf, EvalConfig, MatchScheme, TaggingFormat};
///
/// let tokens = vec![vec!["Jane", "Doe", "visits", "Quebec"]];
/// let gold = vec![vec!["B-PER", "I-PER", "O", "B-LOC"]];
/// let predicted = vec![vec!["B-PER", "I-PER", "O", "B-ORG"]];
///
/// let evaluator =
///     evaluate_tagged_corpus_conf(&tokens, &gold, &predicted, &EvalConfig::default()).unwrap();
/// assert_eq!(evaluator.format(), TaggingFormat::IOB2);
///
/// let reporter = evaluator.report(MatchScheme::Strict).unwrap();
/// let expected_report = "Class, Precision, Recall, Fscore, Support
/// Overall_Micro, 0.5, 0.5, 0.5, 2
/// Overall_Macro, 0.5, 0.5, 0.5, 2
/// Overall_Weighted, 0.5, 0.5, 0.5, 2
/// LOC, 0, 0, 0, 1
/// PER, 1, 1, 1, 1\n";
/// assert_eq!(expected_report, reporter.to_string());
///
/// let partial = evaluator.result().unwrap().scorecard(MatchScheme::Partial);
/// assert_eq!(partial.precision(), 1.0);
/// ```
pub fn evaluate_tagged_corpus_conf<T, G>(
    tokens: &[Vec<T>],
    gold_tags: &[Vec<G>],
    predicted_tags: &[Vec<G>],
    config: &EvalConfig,
) -> Result<TaggedCorpusEvaluator, EvaluationError>
where
    T: AsRef<str>,
    G: AsRef<str>,
{
    let mut evaluator = TaggedCorpusEvaluator::new(tokens, gold_tags, predicted_tags, config)?;
    evaluator.evaluate();
    Ok(evaluator)
}
