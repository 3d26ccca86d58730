use nereval::{
    evaluate_tagged_corpus_conf, Average, ClassMetrics, CorpusEvaluator, EvalConfigBuilder,
    EvaluationError, MatchScheme, ScoreCardSummary, Span, TaggingFormat,
};
use std::collections::HashSet;

pub trait CloseEnough {
    fn are_close(&self, other: &Self, eps: f64) -> bool;
}

// ClassMetrics does not have the default PartialEq implementation.
impl CloseEnough for ClassMetrics {
    fn are_close(&self, other: &Self, eps: f64) -> bool {
        let are_equal = self == other;
        let precision_is_equal = f64::abs(self.precision - other.precision) < eps;
        let recall_is_equal = f64::abs(self.recall - other.recall) < eps;
        let fscore_is_equal = f64::abs(self.fscore - other.fscore) < eps;
        let support_is_equal = self.support == other.support;
        are_equal && precision_is_equal && recall_is_equal && fscore_is_equal && support_is_equal
    }
}

impl CloseEnough for ScoreCardSummary {
    fn are_close(&self, other: &Self, eps: f64) -> bool {
        let counts = (
            self.correct_counts,
            self.incorrect_counts,
            self.partial_counts,
            self.missed_counts,
            self.spurious_counts,
        ) == (
            other.correct_counts,
            other.incorrect_counts,
            other.partial_counts,
            other.missed_counts,
            other.spurious_counts,
        );
        counts
            && f64::abs(self.precision - other.precision) < eps
            && f64::abs(self.recall - other.recall) < eps
            && f64::abs(self.f1 - other.f1) < eps
    }
}

fn span(span_type: &str, start: usize, end: usize) -> Span {
    Span::new(span_type, start, end).unwrap()
}

fn expected_card(
    counts: [usize; 5],
    precision: f64,
    recall: f64,
    f1: f64,
) -> ScoreCardSummary {
    let [correct, incorrect, partial, missed, spurious] = counts;
    ScoreCardSummary {
        correct_counts: correct,
        incorrect_counts: incorrect,
        partial_counts: partial,
        missed_counts: missed,
        spurious_counts: spurious,
        possible: correct + incorrect + partial + missed,
        actual: correct + incorrect + partial + spurious,
        precision,
        recall,
        f1,
    }
}

fn mixed_document() -> (Vec<Span>, Vec<Span>) {
    let gold = vec![
        span("PER", 59, 69),
        span("LOC", 127, 134),
        span("LOC", 164, 174),
        span("LOC", 197, 205),
        span("LOC", 208, 219),
        span("MISC", 230, 240),
    ];
    let predicted = vec![
        span("PER", 24, 30),
        span("LOC", 124, 134),
        span("PER", 164, 174),
        span("LOC", 197, 205),
        span("LOC", 208, 219),
        span("LOC", 225, 243),
    ];
    (gold, predicted)
}

fn metric(class: &str, average: Average, p: f64, r: f64, f: f64, support: usize) -> ClassMetrics {
    ClassMetrics {
        class: String::from(class),
        average,
        precision: p,
        recall: r,
        fscore: f,
        support,
    }
}

#[test]
fn mixed_document_every_scheme() {
    let (gold, predicted) = mixed_document();
    let mut corpus = CorpusEvaluator::new(vec![gold], vec![predicted]).unwrap();
    corpus.evaluate();
    let summary = corpus.result().unwrap().summarize_result();
    let third = 1.0 / 3.0;
    let expected = [
        (MatchScheme::Strict, expected_card([2, 3, 0, 1, 1], third, third, third)),
        (MatchScheme::Type, expected_card([3, 2, 0, 1, 1], 0.5, 0.5, 0.5)),
        (
            MatchScheme::Partial,
            expected_card([3, 0, 2, 1, 1], 2.0 / 3.0, 2.0 / 3.0, 2.0 / 3.0),
        ),
        (MatchScheme::Bounds, expected_card([3, 2, 0, 1, 1], 0.5, 0.5, 0.5)),
    ];
    for (scheme, card) in expected {
        dbg!(scheme, summary.scheme(scheme));
        assert!(summary.scheme(scheme).are_close(&card, 1e-9));
    }
    assert_eq!(summary.type_match_bounds_match, 2);
    assert_eq!(summary.type_match_bounds_partial, 1);
    assert_eq!(summary.type_mismatch_bounds_match, 1);
    assert_eq!(summary.type_mismatch_bounds_partial, 1);
    assert_eq!(summary.missed_gold_span, 1);
    assert_eq!(summary.spurious_predicted_span, 1);
}

#[test]
fn mixed_document_strict_report() {
    let (gold, predicted) = mixed_document();
    let mut corpus = CorpusEvaluator::new(vec![gold], vec![predicted]).unwrap();
    corpus.evaluate();
    let actual_reporter: HashSet<ClassMetrics> = corpus.report(MatchScheme::Strict).unwrap().into();
    let third = 1.0 / 3.0;
    let sixth = 1.0 / 6.0;
    let expected_reporter = vec![
        metric("Overall_Micro", Average::Micro, third, third, third, 6),
        metric("Overall_Macro", Average::Macro, sixth, sixth, sixth, 6),
        metric("Overall_Weighted", Average::Weighted, third, third, third, 6),
        metric("LOC", Average::None, 0.5, 0.5, 0.5, 4),
        metric("MISC", Average::None, 0.0, 0.0, 0.0, 1),
        metric("PER", Average::None, 0.0, 0.0, 0.0, 1),
    ];
    assert_eq!(actual_reporter.len(), expected_reporter.len());
    for expected_class in expected_reporter.into_iter() {
        dbg!(&expected_class);
        let actual_class = actual_reporter.get(&expected_class).unwrap();
        dbg!(actual_class);
        assert!(actual_class.are_close(&expected_class, 1e-9));
    }
}

#[test]
fn same_type_partial_overlap() {
    let mut corpus =
        CorpusEvaluator::new(vec![vec![span("PER", 29, 69)]], vec![vec![span("PER", 24, 30)]])
            .unwrap();
    corpus.evaluate();
    let summary = corpus.result().unwrap().summarize_result();
    assert!(summary
        .scheme(MatchScheme::Strict)
        .are_close(&expected_card([0, 1, 0, 0, 0], 0.0, 0.0, 0.0), 1e-9));
    assert!(summary
        .scheme(MatchScheme::Type)
        .are_close(&expected_card([1, 0, 0, 0, 0], 1.0, 1.0, 1.0), 1e-9));
    assert!(summary
        .scheme(MatchScheme::Partial)
        .are_close(&expected_card([0, 0, 1, 0, 0], 0.5, 0.5, 0.5), 1e-9));
    assert!(summary
        .scheme(MatchScheme::Bounds)
        .are_close(&expected_card([0, 1, 0, 0, 0], 0.0, 0.0, 0.0), 1e-9));
}

#[test]
fn spurious_only_document() {
    let mut corpus = CorpusEvaluator::new(vec![vec![]], vec![vec![span("PER", 10, 32)]]).unwrap();
    corpus.evaluate();
    let summary = corpus.result().unwrap().summarize_result();
    for card in [
        summary.strict_match,
        summary.type_match,
        summary.partial_match,
        summary.bounds_match,
    ] {
        assert_eq!(card.spurious_counts, 1);
        assert_eq!(card.possible, 0);
        assert_eq!(card.actual, 1);
        assert_eq!((card.precision, card.recall, card.f1), (0.0, 0.0, 0.0));
    }
    let by_tag = corpus.results_grouped_by_tags().unwrap();
    assert_eq!(by_tag["PER"].spurious_predicted_spans(), &[span("PER", 10, 32)]);
}

#[test]
fn tagged_corpus_with_suffix() {
    let tokens = vec![vec!["Marie", "Curie", "won"], vec!["in", "Stockholm"]];
    let gold = vec![vec!["PER-B", "PER-I", "O"], vec!["O", "LOC-B"]];
    let predicted = vec![vec!["PER-B", "O", "O"], vec!["O", "LOC-B"]];
    let config = EvalConfigBuilder::default().suffix(true).build();
    let evaluator = evaluate_tagged_corpus_conf(&tokens, &gold, &predicted, &config).unwrap();
    assert_eq!(evaluator.format(), TaggingFormat::IOB2);
    let total = evaluator.result().unwrap();
    assert_eq!(total.scorecard(MatchScheme::Strict).precision(), 0.5);
    assert_eq!(total.scorecard(MatchScheme::Type).precision(), 1.0);
    assert_eq!(total.scorecard(MatchScheme::Partial).precision(), 0.75);
    let by_document = evaluator.results_by_document().unwrap();
    assert_eq!(by_document.len(), 2);
    assert_eq!(
        by_document[1].total.scorecard(MatchScheme::Strict).correct()[0]
            .gold
            .spanned_tokens()
            .unwrap(),
        &[String::from("Stockholm")]
    );
}

#[test]
fn tagged_corpus_rejects_unparsable_tags() {
    let tokens = vec![vec!["a", "b"]];
    let gold = vec![vec!["B-PER", "X-PER"]];
    let predicted = vec![vec!["B-PER", "O"]];
    let config = EvalConfigBuilder::default().build();
    let err = evaluate_tagged_corpus_conf(&tokens, &gold, &predicted, &config).unwrap_err();
    assert!(matches!(err, EvaluationError::AutoDetect(_)));
}

#[test]
fn results_require_evaluation() {
    let corpus = CorpusEvaluator::new(vec![vec![span("PER", 0, 0)]], vec![vec![]]).unwrap();
    assert_eq!(
        corpus.report(MatchScheme::Strict).unwrap_err(),
        EvaluationError::NotEvaluated
    );
}

#[test]
fn span_deserialization_checks_range() {
    let ok: Span = serde_json::from_str(
        r#"{"span_type":"PER","start":2,"end":4,"spanned_tokens":null,"span_context":null}"#,
    )
    .unwrap();
    assert_eq!(ok, span("PER", 2, 4));
    let err = serde_json::from_str::<Span>(
        r#"{"span_type":"PER","start":5,"end":4,"spanned_tokens":null,"span_context":null}"#,
    )
    .unwrap_err();
    assert!(err
        .to_string()
        .contains("Start IDX for a span cannot be > End IDX. Got start 5 and end 4."));
}
