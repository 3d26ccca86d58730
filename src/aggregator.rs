/**
This module routes the outcome of every comparison between a gold span and a predicted span into
the four scorecards, one per matching scheme.
*/
use crate::entity::{GoldPredictedPair, Span};
use crate::metrics::{MatchScheme, ScoreCard, ScoreCardSummary};
use enum_iterator::{all, Sequence};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use thiserror::Error;

/// The six mutually exclusive outcomes of the alignment of gold and predicted spans.
#[derive(
    Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Sequence, Serialize, Deserialize,
)]
pub enum Scenario {
    /// Same type and same bounds.
    TypeMatchBoundsMatch,
    /// A predicted span without any gold counterpart.
    SpuriousPredictedSpan,
    /// A gold span without any predicted counterpart.
    MissedGoldSpan,
    /// Same bounds, different types.
    TypeMismatchBoundsMatch,
    /// Same type, overlapping but different bounds.
    TypeMatchBoundsPartial,
    /// Different types, overlapping but different bounds.
    TypeMismatchBoundsPartial,
}

impl Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
enum PairOutcome {
    Correct,
    Incorrect,
    Partial,
}

impl Scenario {
    /// Bucket receiving the pair in the strict, type, partial and bounds scorecards (in the order
    /// of `MatchScheme`). `None` for the scenarios involving a single span.
    const fn pair_routing(self) -> Option<[PairOutcome; 4]> {
        use PairOutcome::*;
        match self {
            Scenario::TypeMatchBoundsMatch => Some([Correct, Correct, Correct, Correct]),
            Scenario::TypeMismatchBoundsMatch => Some([Incorrect, Incorrect, Correct, Correct]),
            Scenario::TypeMatchBoundsPartial => Some([Incorrect, Correct, Partial, Incorrect]),
            Scenario::TypeMismatchBoundsPartial => {
                Some([Incorrect, Incorrect, Partial, Incorrect])
            }
            Scenario::SpuriousPredictedSpan | Scenario::MissedGoldSpan => None,
        }
    }
}

/// Owns one `ScoreCard` per matching scheme and the raw list of every scenario. The raw lists
/// keep the pairing of each outcome; the scorecards hold the same outcomes routed per scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawResultAggregator")]
pub struct ResultAggregator {
    strict_match: ScoreCard,
    type_match: ScoreCard,
    partial_match: ScoreCard,
    bounds_match: ScoreCard,
    type_match_bounds_match: Vec<GoldPredictedPair>,
    spurious_predicted_span: Vec<Span>,
    missed_gold_span: Vec<Span>,
    type_mismatch_bounds_match: Vec<GoldPredictedPair>,
    type_match_bounds_partial: Vec<GoldPredictedPair>,
    type_mismatch_bounds_partial: Vec<GoldPredictedPair>,
}

/// Error returned when a serialized aggregator does not hold the outcomes of its own lists.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Error)]
pub enum InconsistentAggregatorError {
    #[error("The {slot} scorecard was serialized with the {found} scheme")]
    SchemeMismatch {
        slot: MatchScheme,
        found: MatchScheme,
    },
    #[error("The outcomes of the {0} scorecard do not match the scenario lists")]
    OutcomeMismatch(MatchScheme),
}

#[derive(Deserialize)]
struct RawResultAggregator {
    strict_match: ScoreCard,
    type_match: ScoreCard,
    partial_match: ScoreCard,
    bounds_match: ScoreCard,
    type_match_bounds_match: Vec<GoldPredictedPair>,
    spurious_predicted_span: Vec<Span>,
    missed_gold_span: Vec<Span>,
    type_mismatch_bounds_match: Vec<GoldPredictedPair>,
    type_match_bounds_partial: Vec<GoldPredictedPair>,
    type_mismatch_bounds_partial: Vec<GoldPredictedPair>,
}

impl TryFrom<RawResultAggregator> for ResultAggregator {
    type Error = InconsistentAggregatorError;
    fn try_from(value: RawResultAggregator) -> Result<Self, Self::Error> {
        let aggregator = ResultAggregator {
            strict_match: value.strict_match,
            type_match: value.type_match,
            partial_match: value.partial_match,
            bounds_match: value.bounds_match,
            type_match_bounds_match: value.type_match_bounds_match,
            spurious_predicted_span: value.spurious_predicted_span,
            missed_gold_span: value.missed_gold_span,
            type_mismatch_bounds_match: value.type_mismatch_bounds_match,
            type_match_bounds_partial: value.type_match_bounds_partial,
            type_mismatch_bounds_partial: value.type_mismatch_bounds_partial,
        };
        aggregator.check_consistency()?;
        Ok(aggregator)
    }
}

impl Default for ResultAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultAggregator {
    pub fn new() -> Self {
        ResultAggregator {
            strict_match: ScoreCard::new(MatchScheme::Strict),
            type_match: ScoreCard::new(MatchScheme::Type),
            partial_match: ScoreCard::new(MatchScheme::Partial),
            bounds_match: ScoreCard::new(MatchScheme::Bounds),
            type_match_bounds_match: vec![],
            spurious_predicted_span: vec![],
            missed_gold_span: vec![],
            type_mismatch_bounds_match: vec![],
            type_match_bounds_partial: vec![],
            type_mismatch_bounds_partial: vec![],
        }
    }

    /// Scenario I: same type and same bounds.
    pub fn add_type_match_bounds_match(&mut self, gold: Span, predicted: Span) {
        let pair = GoldPredictedPair::new(gold, predicted);
        self.route_pair(Scenario::TypeMatchBoundsMatch, &pair);
        self.type_match_bounds_match.push(pair);
    }

    /// Scenario II: a predicted span matching no gold span.
    pub fn add_spurious_predicted_span(&mut self, predicted: Span) {
        for card in self.scorecards_mut() {
            card.push_spurious(predicted.clone());
        }
        self.spurious_predicted_span.push(predicted);
    }

    /// Scenario III: a gold span matched by no predicted span.
    pub fn add_missed_gold_span(&mut self, gold: Span) {
        for card in self.scorecards_mut() {
            card.push_missed(gold.clone());
        }
        self.missed_gold_span.push(gold);
    }

    /// Scenario IV: same bounds, different types.
    pub fn add_type_mismatch_bounds_match(&mut self, gold: Span, predicted: Span) {
        let pair = GoldPredictedPair::new(gold, predicted);
        self.route_pair(Scenario::TypeMismatchBoundsMatch, &pair);
        self.type_mismatch_bounds_match.push(pair);
    }

    /// Scenario V: same type, overlapping bounds.
    pub fn add_type_match_bounds_partial(&mut self, gold: Span, predicted: Span) {
        let pair = GoldPredictedPair::new(gold, predicted);
        self.route_pair(Scenario::TypeMatchBoundsPartial, &pair);
        self.type_match_bounds_partial.push(pair);
    }

    /// Scenario VI: different types, overlapping bounds.
    pub fn add_type_mismatch_bounds_partial(&mut self, gold: Span, predicted: Span) {
        let pair = GoldPredictedPair::new(gold, predicted);
        self.route_pair(Scenario::TypeMismatchBoundsPartial, &pair);
        self.type_mismatch_bounds_partial.push(pair);
    }

    fn route_pair(&mut self, scenario: Scenario, pair: &GoldPredictedPair) {
        let Some(routing) = scenario.pair_routing() else {
            return;
        };
        for (card, outcome) in self.scorecards_mut().into_iter().zip(routing) {
            match outcome {
                PairOutcome::Correct => card.push_correct(pair.clone()),
                PairOutcome::Incorrect => card.push_incorrect(pair.clone()),
                PairOutcome::Partial => card.push_partial(pair.clone()),
            }
        }
    }

    /// Makes sure every scorecard sits in the slot of its scheme and holds as many outcomes of
    /// each kind as the routing of the scenario lists gives it.
    fn check_consistency(&self) -> Result<(), InconsistentAggregatorError> {
        let pair_scenarios = [
            Scenario::TypeMatchBoundsMatch,
            Scenario::TypeMismatchBoundsMatch,
            Scenario::TypeMatchBoundsPartial,
            Scenario::TypeMismatchBoundsPartial,
        ];
        for (idx, (slot, card)) in all::<MatchScheme>().zip(self.scorecards()).enumerate() {
            if card.scheme() != slot {
                return Err(InconsistentAggregatorError::SchemeMismatch {
                    slot,
                    found: card.scheme(),
                });
            }
            let mut expected = [0; 3];
            for scenario in pair_scenarios {
                if let Some(routing) = scenario.pair_routing() {
                    expected[routing[idx] as usize] += self.scenario_pairs(scenario).len();
                }
            }
            let actual = [card.correct().len(), card.incorrect().len(), card.partial().len()];
            if actual != expected
                || card.missed().len() != self.missed_gold_span.len()
                || card.spurious().len() != self.spurious_predicted_span.len()
            {
                return Err(InconsistentAggregatorError::OutcomeMismatch(slot));
            }
        }
        Ok(())
    }

    /// Appends every outcome of `other` after the ones of `self`.
    pub fn merge_result_aggregator(&mut self, other: &ResultAggregator) {
        self.type_match_bounds_match
            .extend_from_slice(&other.type_match_bounds_match);
        self.spurious_predicted_span
            .extend_from_slice(&other.spurious_predicted_span);
        self.missed_gold_span
            .extend_from_slice(&other.missed_gold_span);
        self.type_mismatch_bounds_match
            .extend_from_slice(&other.type_mismatch_bounds_match);
        self.type_match_bounds_partial
            .extend_from_slice(&other.type_match_bounds_partial);
        self.type_mismatch_bounds_partial
            .extend_from_slice(&other.type_mismatch_bounds_partial);
        for (card, other_card) in self.scorecards_mut().into_iter().zip(other.scorecards()) {
            card.merge_from(other_card);
        }
    }

    pub fn summarize_result(&self) -> ResultSummary {
        ResultSummary {
            strict_match: self.strict_match.summary(),
            type_match: self.type_match.summary(),
            partial_match: self.partial_match.summary(),
            bounds_match: self.bounds_match.summary(),
            type_match_bounds_match: self.type_match_bounds_match.len(),
            spurious_predicted_span: self.spurious_predicted_span.len(),
            missed_gold_span: self.missed_gold_span.len(),
            type_mismatch_bounds_match: self.type_mismatch_bounds_match.len(),
            type_match_bounds_partial: self.type_match_bounds_partial.len(),
            type_mismatch_bounds_partial: self.type_mismatch_bounds_partial.len(),
        }
    }

    pub fn scorecard(&self, scheme: MatchScheme) -> &ScoreCard {
        match scheme {
            MatchScheme::Strict => &self.strict_match,
            MatchScheme::Type => &self.type_match,
            MatchScheme::Partial => &self.partial_match,
            MatchScheme::Bounds => &self.bounds_match,
        }
    }

    /// The four scorecards, in the order of `MatchScheme`.
    pub fn scorecards(&self) -> [&ScoreCard; 4] {
        [
            &self.strict_match,
            &self.type_match,
            &self.partial_match,
            &self.bounds_match,
        ]
    }

    fn scorecards_mut(&mut self) -> [&mut ScoreCard; 4] {
        [
            &mut self.strict_match,
            &mut self.type_match,
            &mut self.partial_match,
            &mut self.bounds_match,
        ]
    }

    /// Pairs of the given scenario. Empty for the spurious and missed scenarios.
    pub fn scenario_pairs(&self, scenario: Scenario) -> &[GoldPredictedPair] {
        match scenario {
            Scenario::TypeMatchBoundsMatch => &self.type_match_bounds_match,
            Scenario::TypeMismatchBoundsMatch => &self.type_mismatch_bounds_match,
            Scenario::TypeMatchBoundsPartial => &self.type_match_bounds_partial,
            Scenario::TypeMismatchBoundsPartial => &self.type_mismatch_bounds_partial,
            Scenario::SpuriousPredictedSpan | Scenario::MissedGoldSpan => &[],
        }
    }

    pub fn spurious_predicted_spans(&self) -> &[Span] {
        &self.spurious_predicted_span
    }

    pub fn missed_gold_spans(&self) -> &[Span] {
        &self.missed_gold_span
    }

    pub fn scenario_count(&self, scenario: Scenario) -> usize {
        match scenario {
            Scenario::SpuriousPredictedSpan => self.spurious_predicted_span.len(),
            Scenario::MissedGoldSpan => self.missed_gold_span.len(),
            s => self.scenario_pairs(s).len(),
        }
    }

    /// True when no outcome has been recorded.
    pub fn is_empty(&self) -> bool {
        all::<Scenario>().all(|s| self.scenario_count(s) == 0)
    }
}

/// Summary of the four scorecards and the number of outcomes of each scenario.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ResultSummary {
    pub strict_match: ScoreCardSummary,
    pub type_match: ScoreCardSummary,
    pub partial_match: ScoreCardSummary,
    pub bounds_match: ScoreCardSummary,
    pub type_match_bounds_match: usize,
    pub spurious_predicted_span: usize,
    pub missed_gold_span: usize,
    pub type_mismatch_bounds_match: usize,
    pub type_match_bounds_partial: usize,
    pub type_mismatch_bounds_partial: usize,
}

impl ResultSummary {
    pub fn scheme(&self, scheme: MatchScheme) -> &ScoreCardSummary {
        match scheme {
            MatchScheme::Strict => &self.strict_match,
            MatchScheme::Type => &self.type_match,
            MatchScheme::Partial => &self.partial_match,
            MatchScheme::Bounds => &self.bounds_match,
        }
    }
}
