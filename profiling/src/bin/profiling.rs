use clap::Parser;
use nereval::{
    Average, ClassMetrics, EvalConfigBuilder, MatchScheme, TaggedCorpusEvaluator, TaggingFormat,
};
use serde::Deserialize;
use serde_jsonlines::json_lines;
use std::collections::HashSet;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Deserialize)]
struct Document {
    tokens: Vec<String>,
    gold_tags: Vec<String>,
    predicted_tags: Vec<String>,
}

type Corpus = (Vec<Vec<String>>, Vec<Vec<String>>, Vec<Vec<String>>);

fn load_corpus<P: AsRef<Path>>(path: P) -> Result<Corpus, Box<dyn Error>> {
    let documents = json_lines::<Document, P>(path)?.collect::<Result<Vec<_>, _>>()?;
    let mut tokens = Vec::with_capacity(documents.len());
    let mut gold = Vec::with_capacity(documents.len());
    let mut predicted = Vec::with_capacity(documents.len());
    for document in documents {
        tokens.push(document.tokens);
        gold.push(document.gold_tags);
        predicted.push(document.predicted_tags);
    }
    Ok((tokens, gold, predicted))
}

#[derive(Debug, Parser)]
struct Args {
    /// Number of times the corpus is evaluated.
    #[arg(short, long, default_value_t = 1)]
    n_samples: u32,
    /// JSON lines file, one `{tokens, gold_tags, predicted_tags}` document per line.
    #[arg(short, long, default_value = "./data/datasets/big_dataset.jsonl")]
    path: PathBuf,
    /// Align the documents on multiple cores.
    #[arg(long, default_value_t = false)]
    parallel: bool,
    /// Number of tokens kept around every span.
    #[arg(short, long, default_value_t = 0)]
    context_padding: usize,
    /// Tagging format of the corpus (iob, iob2, bioes, bilou). Detected when omitted.
    #[arg(short, long)]
    format: Option<TaggingFormat>,
    /// Matching scheme of the report (strict, type, partial, bounds).
    #[arg(short, long, default_value = "strict")]
    scheme: MatchScheme,
    /// Only print the report rows of this average (none, micro, macro, weighted).
    #[arg(short, long)]
    average: Option<Average>,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Args::parse();
    let (tokens, gold, predicted) = load_corpus(&args.path)?;
    info!(documents = tokens.len(), path = %args.path.display(), "corpus loaded");
    let builder = EvalConfigBuilder::default()
        .parallel(args.parallel)
        .context_padding(args.context_padding);
    let config = match args.format {
        Some(format) => builder.format(format).build(),
        None => builder.auto_detect().build(),
    };
    let mut total_duration = Duration::ZERO;
    let mut last = None;
    for _ in 0..args.n_samples {
        let now = Instant::now();
        let mut evaluator = TaggedCorpusEvaluator::new(&tokens, &gold, &predicted, &config)?;
        evaluator.evaluate();
        total_duration += now.elapsed();
        last = Some(evaluator);
    }
    info!(
        seconds = total_duration.as_secs_f64(),
        n_samples = args.n_samples,
        "total duration"
    );
    if let Some(evaluator) = last {
        let summary = evaluator.result()?.summarize_result();
        println!("{}", serde_json::to_string_pretty(&summary)?);
        let reporter = evaluator.report(args.scheme)?;
        match args.average {
            None => println!("{}", reporter),
            Some(average) => {
                let rows: HashSet<ClassMetrics> = reporter.into();
                for row in rows.iter().filter(|row| row.average == average) {
                    println!(
                        "{}, {}, {}, {}, {}",
                        row.class, row.precision, row.recall, row.fscore, row.support
                    );
                }
            }
        }
    }
    Ok(())
}
