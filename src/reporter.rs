/**
This module gives a few tools to prettyprint the metrics of every entity type and the overall
metrics of a matching scheme.
*/
use crate::aggregator::ResultAggregator;
use crate::metrics::{MatchScheme, ScoreCard};
use itertools::multizip;
use ndarray::Array1;
use ndarray_stats::SummaryStatisticsExt;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt::Display;
use std::hash::Hash;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

/// The reporter holds the metrics of every entity type and the overall metrics for a single
/// matching scheme. It can be used to display the results (i.e. prettyprint them) as if they were
/// collected into a dataframe and can be consumed to obtain a `HashSet` containing the metrics.
///
/// # Example
///
/// ```rust
/// use nereval::{CorpusEvaluator, MatchScheme, Span};
///
/// let gold = vec![vec![Span::new("PER", 0, 1).unwrap(), Span::new("LOC", 3, 3).unwrap()]];
/// let predicted = vec![vec![Span::new("PER", 0, 1).unwrap(), Span::new("LOC", 5, 5).unwrap()]];
/// let mut corpus = CorpusEvaluator::new(gold, predicted).unwrap();
/// corpus.evaluate();
/// let reporter = corpus.report(MatchScheme::Strict).unwrap();
///
/// let expected_report = "Class, Precision, Recall, Fscore, Support
/// Overall_Micro, 0.5, 0.5, 0.5, 2
/// Overall_Macro, 0.5, 0.5, 0.5, 2
/// Overall_Weighted, 0.5, 0.5, 0.5, 2
/// LOC, 0, 0, 0, 1
/// PER, 1, 1, 1, 1\n";
///
/// assert_eq!(expected_report, reporter.to_string());
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Reporter {
    scheme: MatchScheme,
    pub(crate) classes: BTreeSet<ClassMetricsInner>,
}

/// By converting the reporter into a `HashSet` of `ClassMetrics`, you lose the ordering of the
/// reporter. If you mean to consume the data without prettyprinting it, this is not a problem.
impl From<Reporter> for HashSet<ClassMetrics> {
    fn from(value: Reporter) -> Self {
        value.classes.into_iter().map(ClassMetrics::from).collect()
    }
}

impl Reporter {
    pub fn new(scheme: MatchScheme) -> Self {
        Reporter {
            scheme,
            classes: BTreeSet::new(),
        }
    }

    pub(crate) fn insert(&mut self, metrics: ClassMetricsInner) -> bool {
        self.classes.insert(metrics)
    }

    pub fn scheme(&self) -> MatchScheme {
        self.scheme
    }

    /// Builds the report of a matching scheme. The micro average is read from the total
    /// aggregator, the macro and weighted averages are computed over the entity types. The
    /// support of an entity type is its number of possible matches.
    ///
    /// * `total`: Aggregator of every outcome.
    /// * `by_tag`: One aggregator per entity type.
    /// * `scheme`: The scheme to report.
    pub fn from_results(
        total: &ResultAggregator,
        by_tag: &BTreeMap<String, ResultAggregator>,
        scheme: MatchScheme,
    ) -> Self {
        let mut reporter = Reporter::new(scheme);
        let cards: Vec<&ScoreCard> = by_tag.values().map(|a| a.scorecard(scheme)).collect();
        let precision: Array1<f64> = cards.iter().map(|c| c.precision()).collect();
        let recall: Array1<f64> = cards.iter().map(|c| c.recall()).collect();
        let f1: Array1<f64> = cards.iter().map(|c| c.f1()).collect();
        let support: Array1<f64> = cards.iter().map(|c| c.possible() as f64).collect();
        for (name, p, r, f, card) in multizip((
            by_tag.keys(),
            precision.iter(),
            recall.iter(),
            f1.iter(),
            cards.iter(),
        )) {
            reporter.insert(ClassMetricsInner {
                class: name.clone(),
                average: Average::None,
                precision: *p,
                recall: *r,
                fscore: *f,
                support: card.possible(),
            });
        }

        let total_card = total.scorecard(scheme);
        let total_support = total_card.possible();
        reporter.insert(ClassMetricsInner::new_overall(
            OverallAverage::Micro,
            total_card.precision(),
            total_card.recall(),
            total_card.f1(),
            total_support,
        ));
        reporter.insert(ClassMetricsInner::new_overall(
            OverallAverage::Macro,
            precision.mean().unwrap_or(0.0),
            recall.mean().unwrap_or(0.0),
            f1.mean().unwrap_or(0.0),
            total_support,
        ));
        let weighted = |values: &Array1<f64>| -> f64 {
            if support.sum() == 0.0 {
                return 0.0;
            }
            values.weighted_mean(&support).unwrap_or(0.0)
        };
        if support.sum() == 0.0 && !cards.is_empty() {
            warn!(%scheme, "no support for any entity type: the weighted average is replaced by 0");
        }
        reporter.insert(ClassMetricsInner::new_overall(
            OverallAverage::Weighted,
            weighted(&precision),
            weighted(&recall),
            weighted(&f1),
            total_support,
        ));
        reporter
    }
}

/// The Reporter struct acts as a dataframe when displayed.
impl Display for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Class, Precision, Recall, Fscore, Support")?;
        for v in self.classes.iter() {
            writeln!(f, "{}", v)?
        }
        Ok(())
    }
}

#[derive(Debug)]
/// Datastructure holding metrics about a given class.
pub struct ClassMetrics {
    /// The class, such as "PER", "GEO", "MISC", etc.
    pub class: String,
    /// The average used to compute this class' metrics
    pub average: Average,
    /// Precision metric
    pub precision: f64,
    /// Recall metric
    pub recall: f64,
    /// Fscore metric
    pub fscore: f64,
    /// Support metric
    pub support: usize,
}

impl Hash for ClassMetrics {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.class.hash(state);
        self.average.hash(state)
    }
}

impl PartialEq for ClassMetrics {
    fn eq(&self, other: &Self) -> bool {
        self.class == other.class && self.average == other.average
    }
}
impl Eq for ClassMetrics {}

impl From<ClassMetricsInner> for ClassMetrics {
    fn from(value: ClassMetricsInner) -> Self {
        Self {
            class: value.class,
            average: value.average,
            precision: value.precision,
            recall: value.recall,
            fscore: value.fscore,
            support: value.support,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
/// ClassMetricsInner hold the metrics for a single class. They are ordered by average first (the
/// overall rows come before the entity types) and by class name second.
pub(crate) struct ClassMetricsInner {
    pub(crate) class: String,
    pub(crate) average: Average,
    pub(crate) precision: f64,
    pub(crate) recall: f64,
    pub(crate) fscore: f64,
    pub(crate) support: usize,
}
impl PartialEq for ClassMetricsInner {
    fn eq(&self, other: &Self) -> bool {
        self.class == other.class && self.average == other.average
    }
}
impl Eq for ClassMetricsInner {}

impl PartialOrd for ClassMetricsInner {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ClassMetricsInner {
    fn cmp(&self, other: &Self) -> Ordering {
        self.average
            .cmp(&other.average)
            .then_with(|| self.class.cmp(&other.class))
    }
}

impl ClassMetricsInner {
    pub(crate) fn new_overall(
        average: OverallAverage,
        precision: f64,
        recall: f64,
        fscore: f64,
        support: usize,
    ) -> Self {
        let class = average.to_string();
        ClassMetricsInner {
            class,
            average: average.into(),
            precision,
            recall,
            fscore,
            support,
        }
    }
}

/// The ClassMetricsInner struct acts as a line in a dataframe when displayed.
impl Display for ClassMetricsInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}, {}",
            self.class, self.precision, self.recall, self.fscore, self.support
        )
    }
}

/// Enumeration of the different types of averaging supported by this crate. &str can be parsed to
/// create an `Average`. The overall averages are ordered before `None`, the average of a single
/// entity type.
#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Serialize, Deserialize)]
pub enum Average {
    Micro,
    Macro,
    Weighted,
    None,
}
impl Display for Average {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
impl FromStr for Average {
    type Err = AverageParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Average::None),
            "micro" => Ok(Average::Micro),
            "macro" => Ok(Average::Macro),
            "weighted" => Ok(Average::Weighted),
            _ => Err(AverageParsingError(String::from(s))),
        }
    }
}

#[derive(Debug, PartialEq, PartialOrd, Eq, Ord, Clone, Error)]
#[error("Impossible to parse the string ({0}) into an Average")]
pub struct AverageParsingError(String);

#[derive(Debug, Hash, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub enum OverallAverage {
    Micro,
    Macro,
    Weighted,
}

impl Display for OverallAverage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str_content = match self {
            Self::Micro => "Overall_Micro",
            Self::Macro => "Overall_Macro",
            Self::Weighted => "Overall_Weighted",
        };
        write!(f, "{}", str_content)
    }
}

impl From<OverallAverage> for Average {
    fn from(value: OverallAverage) -> Self {
        match value {
            OverallAverage::Micro => Average::Micro,
            OverallAverage::Macro => Average::Macro,
            OverallAverage::Weighted => Average::Weighted,
        }
    }
}
