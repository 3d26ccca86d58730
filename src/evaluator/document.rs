use crate::aggregator::{ResultAggregator, Scenario};
use crate::entity::Span;
use crate::evaluator::{DocumentResult, EvaluationError, SpanSource};
use crate::metrics::MatchScheme;
use tracing::{debug, instrument, trace};

/// Outcome of one step of the alignment.
#[derive(Debug, Clone, Copy)]
enum Outcome<'a> {
    TypeMatchBoundsMatch(&'a Span, &'a Span),
    TypeMismatchBoundsMatch(&'a Span, &'a Span),
    TypeMatchBoundsPartial(&'a Span, &'a Span),
    TypeMismatchBoundsPartial(&'a Span, &'a Span),
    Spurious(&'a Span),
    Missed(&'a Span),
}

impl<'a> Outcome<'a> {
    /// Outcome of two overlapping spans with different bounds.
    fn partial(gold: &'a Span, predicted: &'a Span) -> Self {
        if gold.span_type() == predicted.span_type() {
            Outcome::TypeMatchBoundsPartial(gold, predicted)
        } else {
            Outcome::TypeMismatchBoundsPartial(gold, predicted)
        }
    }

    fn scenario(&self) -> Scenario {
        match self {
            Outcome::TypeMatchBoundsMatch(..) => Scenario::TypeMatchBoundsMatch,
            Outcome::TypeMismatchBoundsMatch(..) => Scenario::TypeMismatchBoundsMatch,
            Outcome::TypeMatchBoundsPartial(..) => Scenario::TypeMatchBoundsPartial,
            Outcome::TypeMismatchBoundsPartial(..) => Scenario::TypeMismatchBoundsPartial,
            Outcome::Spurious(_) => Scenario::SpuriousPredictedSpan,
            Outcome::Missed(_) => Scenario::MissedGoldSpan,
        }
    }

    /// Entity type the outcome is attributed to.
    fn tag(&self) -> &'a str {
        match *self {
            Outcome::Spurious(predicted) => predicted.span_type(),
            Outcome::Missed(gold)
            | Outcome::TypeMatchBoundsMatch(gold, _)
            | Outcome::TypeMismatchBoundsMatch(gold, _)
            | Outcome::TypeMatchBoundsPartial(gold, _)
            | Outcome::TypeMismatchBoundsPartial(gold, _) => gold.span_type(),
        }
    }

    fn apply(&self, aggregator: &mut ResultAggregator) {
        match *self {
            Outcome::TypeMatchBoundsMatch(g, p) => {
                aggregator.add_type_match_bounds_match(g.clone(), p.clone())
            }
            Outcome::TypeMismatchBoundsMatch(g, p) => {
                aggregator.add_type_mismatch_bounds_match(g.clone(), p.clone())
            }
            Outcome::TypeMatchBoundsPartial(g, p) => {
                aggregator.add_type_match_bounds_partial(g.clone(), p.clone())
            }
            Outcome::TypeMismatchBoundsPartial(g, p) => {
                aggregator.add_type_mismatch_bounds_partial(g.clone(), p.clone())
            }
            Outcome::Spurious(p) => aggregator.add_spurious_predicted_span(p.clone()),
            Outcome::Missed(g) => aggregator.add_missed_gold_span(g.clone()),
        }
    }
}

impl DocumentResult {
    /// Routes an outcome into the document total and into the aggregator of its entity type.
    fn record(&mut self, outcome: Outcome) {
        trace!(scenario = %outcome.scenario(), tag = outcome.tag(), "classified outcome");
        outcome.apply(&mut self.total);
        let tag = outcome.tag();
        match self.by_tag.get_mut(tag) {
            Some(aggregator) => outcome.apply(aggregator),
            None => {
                let mut aggregator = ResultAggregator::new();
                outcome.apply(&mut aggregator);
                self.by_tag.insert(String::from(tag), aggregator);
            }
        }
    }
}

/// Aligns the gold spans and the predicted spans of a single document. Both lists are sorted by
/// `(start, end)` on construction and neither may contain overlapping spans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentEvaluator {
    gold_spans: Vec<Span>,
    predicted_spans: Vec<Span>,
}

/// Sorts the spans and makes sure no span starts before the end of the previous one.
fn sort_and_check_overlaps(spans: &mut [Span], source: SpanSource) -> Result<(), EvaluationError> {
    spans.sort_by_key(Span::sort_key);
    let overlapping = spans
        .windows(2)
        .any(|pair| pair[1].start() <= pair[0].end());
    if overlapping {
        return Err(EvaluationError::OverlappingSpans(source));
    }
    Ok(())
}

impl DocumentEvaluator {
    pub fn new(
        mut gold_spans: Vec<Span>,
        mut predicted_spans: Vec<Span>,
    ) -> Result<Self, EvaluationError> {
        sort_and_check_overlaps(&mut gold_spans, SpanSource::Gold)?;
        sort_and_check_overlaps(&mut predicted_spans, SpanSource::Predicted)?;
        Ok(DocumentEvaluator {
            gold_spans,
            predicted_spans,
        })
    }

    pub fn gold_spans(&self) -> &[Span] {
        &self.gold_spans
    }

    pub fn predicted_spans(&self) -> &[Span] {
        &self.predicted_spans
    }

    /// Classifies every gold and predicted span into one of the six scenarios with a single merge
    /// over both sorted lists.
    ///
    /// The checks are tried in priority order: exact match, same bounds with different types,
    /// overlap, then disjointness. A span consumed by an overlap is flagged so that it is not
    /// reported again as missed or spurious once the other cursor moves past it.
    #[instrument(
        level = "debug",
        skip(self),
        fields(gold = self.gold_spans.len(), predicted = self.predicted_spans.len())
    )]
    pub fn evaluate(&self) -> DocumentResult {
        let gold = &self.gold_spans;
        let predicted = &self.predicted_spans;
        let mut result = DocumentResult::default();
        let (mut g, mut p) = (0, 0);
        let mut gold_overlapped_last_step = false;
        let mut pred_overlapped_last_step = false;

        while g < gold.len() && p < predicted.len() {
            let (gold_span, pred_span) = (&gold[g], &predicted[p]);
            if gold_span == pred_span {
                result.record(Outcome::TypeMatchBoundsMatch(gold_span, pred_span));
                g += 1;
                p += 1;
                gold_overlapped_last_step = false;
                pred_overlapped_last_step = false;
            } else if gold_span.bounds_same_tokens_as(pred_span) {
                result.record(Outcome::TypeMismatchBoundsMatch(gold_span, pred_span));
                g += 1;
                p += 1;
                gold_overlapped_last_step = false;
                pred_overlapped_last_step = false;
            } else if gold_span.overlaps_with(pred_span) {
                result.record(Outcome::partial(gold_span, pred_span));
                if pred_span.ends_after_end_of(gold_span) {
                    // The predicted span may still overlap the next gold span.
                    g += 1;
                    gold_overlapped_last_step = false;
                    pred_overlapped_last_step = true;
                } else if gold_span.ends_after_end_of(pred_span) {
                    p += 1;
                    pred_overlapped_last_step = false;
                    gold_overlapped_last_step = true;
                } else {
                    g += 1;
                    p += 1;
                    gold_overlapped_last_step = false;
                    pred_overlapped_last_step = false;
                }
            } else if pred_span.starts_after_end_of(gold_span) {
                if !gold_overlapped_last_step {
                    result.record(Outcome::Missed(gold_span));
                }
                g += 1;
                gold_overlapped_last_step = false;
            } else {
                if !pred_overlapped_last_step {
                    result.record(Outcome::Spurious(pred_span));
                }
                p += 1;
                pred_overlapped_last_step = false;
            }
        }

        // The span still under the cursor was already scored by an overlap.
        let remaining_gold = g + usize::from(gold_overlapped_last_step);
        for gold_span in gold.iter().skip(remaining_gold) {
            result.record(Outcome::Missed(gold_span));
        }
        let remaining_predicted = p + usize::from(pred_overlapped_last_step);
        for pred_span in predicted.iter().skip(remaining_predicted) {
            result.record(Outcome::Spurious(pred_span));
        }

        debug!(
            strict_f1 = result.total.scorecard(MatchScheme::Strict).f1(),
            tags = result.by_tag.len(),
            "document evaluated"
        );
        result
    }
}
