use crate::aggregator::ResultAggregator;
use crate::entity::Span;
use crate::evaluator::{
    DocumentEvaluator, DocumentResult, EvaluationError, InconsistentLengthError,
};
use crate::metrics::MatchScheme;
use crate::reporter::Reporter;
use ahash::AHashSet;
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// Results folded over every document of the corpus.
#[derive(Debug, Clone, PartialEq)]
struct CorpusResults {
    total: ResultAggregator,
    by_tag: BTreeMap<String, ResultAggregator>,
    by_document: Vec<DocumentResult>,
}

/// Evaluates a corpus, one `DocumentEvaluator` per pair of gold and predicted documents.
/// Results can only be retrieved once `evaluate` has been called.
#[derive(Debug, Clone)]
pub struct CorpusEvaluator {
    documents: Vec<DocumentEvaluator>,
    parallel: bool,
    results: Option<CorpusResults>,
}

impl CorpusEvaluator {
    /// Validates every document. Fails when the number of gold and predicted documents differ or
    /// when a document contains overlapping spans.
    ///
    /// * `gold_documents`: Gold spans, one list per document.
    /// * `predicted_documents`: Predicted spans, one list per document.
    pub fn new(
        gold_documents: Vec<Vec<Span>>,
        predicted_documents: Vec<Vec<Span>>,
    ) -> Result<Self, EvaluationError> {
        if gold_documents.len() != predicted_documents.len() {
            return Err(InconsistentLengthError(
                gold_documents.len(),
                predicted_documents.len(),
            )
            .into());
        }
        let documents = gold_documents
            .into_iter()
            .zip(predicted_documents)
            .map(|(gold, predicted)| DocumentEvaluator::new(gold, predicted))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CorpusEvaluator {
            documents,
            parallel: false,
            results: None,
        })
    }

    /// Can we use multiple cores to align the documents? Folding the results stays sequential
    /// and in document order.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Aligns every document and folds their results into the corpus total and the per-tag
    /// aggregators. Previous results are discarded.
    #[instrument(
        level = "debug",
        skip(self),
        fields(documents = self.documents.len(), parallel = self.parallel)
    )]
    pub fn evaluate(&mut self) {
        let by_document: Vec<DocumentResult> = if self.parallel {
            self.documents
                .par_iter()
                .map(DocumentEvaluator::evaluate)
                .collect()
        } else {
            self.documents
                .iter()
                .map(DocumentEvaluator::evaluate)
                .collect()
        };
        let mut total = ResultAggregator::new();
        let mut by_tag: BTreeMap<String, ResultAggregator> = BTreeMap::new();
        for document in by_document.iter() {
            total.merge_result_aggregator(&document.total);
            for (tag, aggregator) in document.by_tag.iter() {
                by_tag
                    .entry(tag.clone())
                    .or_default()
                    .merge_result_aggregator(aggregator);
            }
        }
        debug!(
            strict_f1 = total.scorecard(MatchScheme::Strict).f1(),
            tags = by_tag.len(),
            "corpus evaluated"
        );
        self.results = Some(CorpusResults {
            total,
            by_tag,
            by_document,
        });
    }

    fn results(&self) -> Result<&CorpusResults, EvaluationError> {
        self.results.as_ref().ok_or(EvaluationError::NotEvaluated)
    }

    /// Aggregated results of the whole corpus.
    pub fn result(&self) -> Result<&ResultAggregator, EvaluationError> {
        Ok(&self.results()?.total)
    }

    pub fn results_grouped_by_tags(
        &self,
    ) -> Result<&BTreeMap<String, ResultAggregator>, EvaluationError> {
        Ok(&self.results()?.by_tag)
    }

    /// Results of every document, in the order they were given.
    pub fn results_by_document(&self) -> Result<&[DocumentResult], EvaluationError> {
        Ok(&self.results()?.by_document)
    }

    /// Builds a report of the per-tag and overall metrics of a matching scheme.
    pub fn report(&self, scheme: MatchScheme) -> Result<Reporter, EvaluationError> {
        let results = self.results()?;
        Ok(Reporter::from_results(&results.total, &results.by_tag, scheme))
    }

    /// Entity types found among the gold spans.
    pub fn unique_gold_span_types(&self) -> AHashSet<&str> {
        self.documents
            .iter()
            .flat_map(|document| document.gold_spans())
            .map(Span::span_type)
            .collect()
    }

    pub fn documents(&self) -> &[DocumentEvaluator] {
        &self.documents
    }

    pub fn is_evaluated(&self) -> bool {
        self.results.is_some()
    }
}
