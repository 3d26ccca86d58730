/**
This module computes the metrics (precision, recall, f-score) of a single matching scheme from the
outcomes that were routed to it.
*/
use crate::entity::{GoldPredictedPair, Span};
use enum_iterator::Sequence;
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use thiserror::Error;

/// The four ways a predicted span can be scored against a gold span.
#[derive(
    Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Sequence, Serialize, Deserialize,
)]
pub enum MatchScheme {
    /// Exact type and exact bounds.
    Strict,
    /// Exact type and overlapping bounds.
    Type,
    /// Overlapping bounds, whatever the type. Overlaps are worth half a match.
    Partial,
    /// Exact bounds, whatever the type.
    Bounds,
}

impl MatchScheme {
    /// The type and partial schemes give half credit to partial matches.
    pub const fn counts_partial_as_half(self) -> bool {
        matches!(self, MatchScheme::Type | MatchScheme::Partial)
    }

    /// Key of the scheme in a serialized summary.
    pub const fn as_str(self) -> &'static str {
        match self {
            MatchScheme::Strict => "strict_match",
            MatchScheme::Type => "type_match",
            MatchScheme::Partial => "partial_match",
            MatchScheme::Bounds => "bounds_match",
        }
    }
}

impl Display for MatchScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Error)]
#[error("Impossible to parse the string ({0}) into a MatchScheme")]
pub struct MatchSchemeParsingError(String);

impl FromStr for MatchScheme {
    type Err = MatchSchemeParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" | "strict_match" => Ok(MatchScheme::Strict),
            "type" | "type_match" => Ok(MatchScheme::Type),
            "partial" | "partial_match" => Ok(MatchScheme::Partial),
            "bounds" | "bounds_match" => Ok(MatchScheme::Bounds),
            _ => Err(MatchSchemeParsingError(String::from(s))),
        }
    }
}

/// Divides and replaces the result by 0 when the denominator is 0.
#[inline(always)]
fn prf_divide(numerator: f64, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator / denominator as f64
    }
}

/// Tally of the outcomes of one matching scheme. The counts and metrics are recomputed after
/// every mutation, so they are always consistent with the outcome lists. Deserialization only
/// reads the scheme and the lists and recomputes everything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawScoreCard")]
pub struct ScoreCard {
    scheme: MatchScheme,
    correct: Vec<GoldPredictedPair>,
    incorrect: Vec<GoldPredictedPair>,
    partial: Vec<GoldPredictedPair>,
    missed: Vec<Span>,
    spurious: Vec<Span>,
    possible: usize,
    actual: usize,
    precision: f64,
    recall: f64,
    f1: f64,
}

/// Serialized form of a scorecard. The counts and metrics are derived data and are ignored.
#[derive(Deserialize)]
struct RawScoreCard {
    scheme: MatchScheme,
    correct: Vec<GoldPredictedPair>,
    incorrect: Vec<GoldPredictedPair>,
    partial: Vec<GoldPredictedPair>,
    missed: Vec<Span>,
    spurious: Vec<Span>,
}

impl From<RawScoreCard> for ScoreCard {
    fn from(value: RawScoreCard) -> Self {
        let mut card = ScoreCard::new(value.scheme);
        card.correct = value.correct;
        card.incorrect = value.incorrect;
        card.partial = value.partial;
        card.missed = value.missed;
        card.spurious = value.spurious;
        card.recalculate_metrics();
        card
    }
}

impl ScoreCard {
    pub fn new(scheme: MatchScheme) -> Self {
        ScoreCard {
            scheme,
            correct: vec![],
            incorrect: vec![],
            partial: vec![],
            missed: vec![],
            spurious: vec![],
            possible: 0,
            actual: 0,
            precision: 0.0,
            recall: 0.0,
            f1: 0.0,
        }
    }

    pub(crate) fn push_correct(&mut self, pair: GoldPredictedPair) {
        self.correct.push(pair);
        self.recalculate_metrics();
    }

    pub(crate) fn push_incorrect(&mut self, pair: GoldPredictedPair) {
        self.incorrect.push(pair);
        self.recalculate_metrics();
    }

    pub(crate) fn push_partial(&mut self, pair: GoldPredictedPair) {
        self.partial.push(pair);
        self.recalculate_metrics();
    }

    pub(crate) fn push_missed(&mut self, gold: Span) {
        self.missed.push(gold);
        self.recalculate_metrics();
    }

    pub(crate) fn push_spurious(&mut self, predicted: Span) {
        self.spurious.push(predicted);
        self.recalculate_metrics();
    }

    /// Recomputes `possible`, `actual`, precision, recall and f1 from the outcome lists. Calling
    /// it twice in a row yields the same values.
    pub fn recalculate_metrics(&mut self) {
        let correct = self.correct.len();
        let incorrect = self.incorrect.len();
        let partial = self.partial.len();
        self.possible = correct + incorrect + partial + self.missed.len();
        self.actual = correct + incorrect + partial + self.spurious.len();
        let matched = if self.scheme.counts_partial_as_half() {
            correct as f64 + 0.5 * partial as f64
        } else {
            correct as f64
        };
        self.precision = prf_divide(matched, self.actual);
        self.recall = prf_divide(matched, self.possible);
        let denominator = self.precision + self.recall;
        self.f1 = if denominator > 0.0 {
            2.0 * self.precision * self.recall / denominator
        } else {
            0.0
        };
    }

    /// Appends the outcomes of `other` after the ones of `self`.
    pub fn merge_from(&mut self, other: &ScoreCard) {
        self.correct.extend_from_slice(&other.correct);
        self.incorrect.extend_from_slice(&other.incorrect);
        self.partial.extend_from_slice(&other.partial);
        self.missed.extend_from_slice(&other.missed);
        self.spurious.extend_from_slice(&other.spurious);
        self.recalculate_metrics();
    }

    pub fn summary(&self) -> ScoreCardSummary {
        ScoreCardSummary {
            correct_counts: self.correct.len(),
            incorrect_counts: self.incorrect.len(),
            partial_counts: self.partial.len(),
            missed_counts: self.missed.len(),
            spurious_counts: self.spurious.len(),
            possible: self.possible,
            actual: self.actual,
            precision: self.precision,
            recall: self.recall,
            f1: self.f1,
        }
    }

    pub fn scheme(&self) -> MatchScheme {
        self.scheme
    }
    pub fn counts_partial_as_half(&self) -> bool {
        self.scheme.counts_partial_as_half()
    }
    pub fn correct(&self) -> &[GoldPredictedPair] {
        &self.correct
    }
    pub fn incorrect(&self) -> &[GoldPredictedPair] {
        &self.incorrect
    }
    pub fn partial(&self) -> &[GoldPredictedPair] {
        &self.partial
    }
    pub fn missed(&self) -> &[Span] {
        &self.missed
    }
    pub fn spurious(&self) -> &[Span] {
        &self.spurious
    }
    pub fn possible(&self) -> usize {
        self.possible
    }
    pub fn actual(&self) -> usize {
        self.actual
    }
    pub fn precision(&self) -> f64 {
        self.precision
    }
    pub fn recall(&self) -> f64 {
        self.recall
    }
    pub fn f1(&self) -> f64 {
        self.f1
    }
}

/// Counts and metrics of a `ScoreCard`, without the outcome lists.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ScoreCardSummary {
    pub correct_counts: usize,
    pub incorrect_counts: usize,
    pub partial_counts: usize,
    pub missed_counts: usize,
    pub spurious_counts: usize,
    pub possible: usize,
    pub actual: usize,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}
