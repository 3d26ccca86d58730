/**
This module aligns gold and predicted spans, one document at a time, and folds the results of the
documents of a corpus.
*/
use crate::aggregator::ResultAggregator;
use crate::entity::{AutoDetectError, InvalidRangeError, ParsingError};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt::Display};
use thiserror::Error;

mod corpus;
mod document;
mod tagged;

pub use corpus::CorpusEvaluator;
pub use document::DocumentEvaluator;
pub use tagged::{evaluate_tagged_document, TaggedCorpusEvaluator};

/// Origin of a list of spans.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum SpanSource {
    Gold,
    Predicted,
}

impl Display for SpanSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gold => write!(f, "Gold"),
            Self::Predicted => write!(f, "Predicted"),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Error)]
#[error("# of documents for which golden tags were provided {0}!= # of documents for which predicted tags were provided {1}")]
/// Error type to represent when the gold and predicted inputs do not cover the same number of
/// documents.
pub struct InconsistentLengthError(pub usize, pub usize);

#[derive(Debug, PartialEq, Eq, Clone, Error)]
/// Enum error encompassing every failure that could happen when evaluating spans.
pub enum EvaluationError {
    #[error("Overlapping {0} Spans found: Overlapping spans are not currently supported.")]
    OverlappingSpans(SpanSource),
    #[error(transparent)]
    InconsistentLength(#[from] InconsistentLengthError),
    #[error("# of documents for which tokens were provided {tokens}!= # of documents for which golden tags were provided {documents}")]
    InconsistentTokens { tokens: usize, documents: usize },
    #[error(
        "Evaluation has not been performed yet. Please call evaluate() before retrieving results."
    )]
    NotEvaluated,
    #[error(transparent)]
    Parsing(#[from] ParsingError),
    #[error(transparent)]
    AutoDetect(#[from] AutoDetectError),
    #[error(transparent)]
    InvalidRange(#[from] InvalidRangeError),
}

/// Results of a single document: one aggregator for the whole document and one per entity type.
/// Spurious spans are attributed to the type of the predicted span, every other outcome to the
/// type of the gold span.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DocumentResult {
    pub total: ResultAggregator,
    pub by_tag: BTreeMap<String, ResultAggregator>,
}
