use crate::config::EvalConfig;
use crate::entity::{Span, SpanLoader, TaggingFormat};
use crate::evaluator::{
    CorpusEvaluator, DocumentEvaluator, DocumentResult, EvaluationError, InconsistentLengthError,
};
use std::ops::{Deref, DerefMut};
use tracing::debug;

/// Picks the configured format, or detects it from the gold tags.
fn build_loader<Q, G>(gold_tags: &[Q], config: &EvalConfig) -> Result<SpanLoader, EvaluationError>
where
    Q: AsRef<[G]>,
    G: AsRef<str>,
{
    let format = match config.format() {
        Some(format) => format,
        None => TaggingFormat::try_auto_detect::<Q, G>(gold_tags, config.suffix())?,
    };
    Ok(format
        .loader()
        .with_context_padding(config.context_padding())
        .with_suffix(config.suffix()))
}

/// Evaluates a corpus given as tag sequences. Every document is converted into spans with the
/// loader of the configured (or detected) format, then aligned by a `CorpusEvaluator`, which this
/// struct dereferences to.
#[derive(Debug, Clone)]
pub struct TaggedCorpusEvaluator {
    format: TaggingFormat,
    corpus: CorpusEvaluator,
}

impl TaggedCorpusEvaluator {
    /// * `tokens`: Tokens of every document.
    /// * `gold_tags`: Gold tags of every document, one per token.
    /// * `predicted_tags`: Predicted tags of every document, one per token.
    /// * `config`: Format, context padding, suffix and parallelism.
    pub fn new<T, G>(
        tokens: &[Vec<T>],
        gold_tags: &[Vec<G>],
        predicted_tags: &[Vec<G>],
        config: &EvalConfig,
    ) -> Result<Self, EvaluationError>
    where
        T: AsRef<str>,
        G: AsRef<str>,
    {
        if gold_tags.len() != predicted_tags.len() {
            return Err(InconsistentLengthError(gold_tags.len(), predicted_tags.len()).into());
        }
        if tokens.len() != gold_tags.len() {
            return Err(EvaluationError::InconsistentTokens {
                tokens: tokens.len(),
                documents: gold_tags.len(),
            });
        }
        let loader = build_loader::<Vec<G>, G>(gold_tags, config)?;
        debug!(format = %loader.format(), documents = tokens.len(), "loading tagged corpus");
        let load = |tags: &[Vec<G>]| -> Result<Vec<Vec<Span>>, EvaluationError> {
            tokens
                .iter()
                .zip(tags)
                .map(|(tokens, tags)| Ok(loader.retrieve_spans(tokens, tags)?))
                .collect()
        };
        let gold_documents = load(gold_tags)?;
        let predicted_documents = load(predicted_tags)?;
        let corpus = CorpusEvaluator::new(gold_documents, predicted_documents)?
            .with_parallel(config.parallel());
        Ok(TaggedCorpusEvaluator {
            format: loader.format(),
            corpus,
        })
    }

    /// Format used to load the tags.
    pub fn format(&self) -> TaggingFormat {
        self.format
    }

    pub fn into_corpus(self) -> CorpusEvaluator {
        self.corpus
    }
}

impl Deref for TaggedCorpusEvaluator {
    type Target = CorpusEvaluator;
    fn deref(&self) -> &Self::Target {
        &self.corpus
    }
}

impl DerefMut for TaggedCorpusEvaluator {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.corpus
    }
}

/// Evaluates a single tagged document.
///
/// * `tokens`: Tokens of the document.
/// * `gold_tags`: Gold tags, one per token.
/// * `predicted_tags`: Predicted tags, one per token.
/// * `config`: Format, context padding and suffix. Parallelism has no effect on a single document.
pub fn evaluate_tagged_document<T, G>(
    tokens: &[T],
    gold_tags: &[G],
    predicted_tags: &[G],
    config: &EvalConfig,
) -> Result<DocumentResult, EvaluationError>
where
    T: AsRef<str>,
    G: AsRef<str>,
{
    let loader = build_loader::<&[G], G>(&[gold_tags], config)?;
    let gold = loader.retrieve_spans(tokens, gold_tags)?;
    let predicted = loader.retrieve_spans(tokens, predicted_tags)?;
    Ok(DocumentEvaluator::new(gold, predicted)?.evaluate())
}
