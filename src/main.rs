use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use morfist_forest::{
    CrossValidation, MaxFeatures, MixedForestConfig, SavedModel, SplitChoice, TargetKind,
    TargetProba,
};
use morfist_io::{
    DatasetReader, ExperimentName, MixedDataset, ResultWriter, TargetPrediction,
    TargetScoreRecord,
};

#[derive(Parser)]
#[command(name = "morfist")]
#[command(about = "Mixed-target random forests for joint classification and regression")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for reproducibility
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel prediction (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Dataset column selection shared by `fit` and `evaluate`.
#[derive(Args, Debug, Clone)]
struct DataArgs {
    /// Path to the input CSV file (first column is the sample ID)
    #[arg(long)]
    data: PathBuf,

    /// Target column names, in output order
    #[arg(long = "target", required = true, num_args = 1..)]
    targets: Vec<String>,

    /// Target columns to treat as class labels (the rest are regression targets)
    #[arg(long = "classify", num_args = 1..)]
    classify: Vec<String>,

    /// Feature column names (defaults to every non-target column)
    #[arg(long = "feature", num_args = 1..)]
    features: Option<Vec<String>>,
}

/// Forest hyperparameters.
#[derive(Args, Debug, Clone)]
struct ForestArgs {
    /// Number of trees in the forest
    #[arg(long, default_value_t = 10)]
    n_trees: usize,

    /// Features tried per split: "sqrt", "log2", "all", a fraction like 0.5, or a count
    #[arg(long, default_value = "sqrt")]
    max_features: String,

    /// Minimum number of samples in each child of a split
    #[arg(long, default_value_t = 5)]
    min_samples_leaf: usize,

    /// How per-target gains are combined: "mean" or "max"
    #[arg(long, default_value = "mean")]
    choose_split: String,

    /// Histogram bins for regression impurity
    #[arg(long, default_value_t = 100)]
    histogram_bins: usize,
}

#[derive(Subcommand)]
enum Command {
    /// Train a forest on all rows, save it, and report feature importances
    Fit {
        #[command(flatten)]
        data: DataArgs,

        #[command(flatten)]
        forest: ForestArgs,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Estimate per-target scores with k-fold cross-validation
    Evaluate {
        #[command(flatten)]
        data: DataArgs,

        #[command(flatten)]
        forest: ForestArgs,

        /// Number of cross-validation folds
        #[arg(long, default_value_t = 5)]
        cv_folds: usize,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Predict every target for new samples with a saved model
    Predict {
        /// Path to the trained model binary
        #[arg(long)]
        model: PathBuf,

        /// Path to the CSV file with the model's feature columns
        #[arg(long)]
        data: PathBuf,

        /// Number of most probable labels to output per classification target (all if unset)
        #[arg(long)]
        top_k: Option<usize>,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct FitOutput {
    experiment: String,
    n_samples: usize,
    n_features: usize,
    n_trees: usize,
    targets: Vec<TargetOutput>,
    top_feature: Option<String>,
    model_path: PathBuf,
}

#[derive(Serialize)]
struct TargetOutput {
    name: String,
    kind: TargetKind,
}

#[derive(Serialize)]
struct EvaluateOutput<'a> {
    experiment: String,
    n_samples: usize,
    n_folds: usize,
    n_trees: usize,
    scores: Vec<ScoreOutput<'a>>,
}

#[derive(Serialize)]
struct ScoreOutput<'a> {
    target: String,
    metric: &'a str,
    pooled: f64,
    mean: f64,
    std: f64,
}

#[derive(Serialize)]
struct PredictOutput {
    experiment: String,
    n_samples: usize,
    model_n_trees: usize,
    model_n_features: usize,
    targets: Vec<TargetOutput>,
}

fn parse_max_features(s: &str) -> Result<MaxFeatures> {
    match s {
        "sqrt" => Ok(MaxFeatures::Sqrt),
        "log2" => Ok(MaxFeatures::Log2),
        "all" => Ok(MaxFeatures::All),
        other if other.contains('.') => other
            .parse::<f64>()
            .map(MaxFeatures::Fraction)
            .with_context(|| format!("invalid max features fraction: {other}")),
        other => other.parse::<usize>().map(MaxFeatures::Fixed).with_context(|| {
            format!("unknown max features: {other} (expected sqrt, log2, all, a fraction, or a count)")
        }),
    }
}

fn parse_choose_split(s: &str) -> Result<SplitChoice> {
    match s {
        "mean" => Ok(SplitChoice::Mean),
        "max" => Ok(SplitChoice::Max),
        other => anyhow::bail!("unknown split choice: {other} (expected mean or max)"),
    }
}

fn kind_name(kind: TargetKind) -> &'static str {
    match kind {
        TargetKind::Classification => "classification",
        TargetKind::Regression => "regression",
    }
}

fn metric_name(kind: TargetKind) -> &'static str {
    match kind {
        TargetKind::Classification => "accuracy",
        TargetKind::Regression => "rmse",
    }
}

fn read_training_data(args: &DataArgs) -> Result<MixedDataset> {
    if let Some(name) = args.classify.iter().find(|c| !args.targets.contains(c)) {
        anyhow::bail!("--classify column {name} is not listed as a --target");
    }
    let mut reader = DatasetReader::new(&args.data).with_target_columns(&args.targets);
    if let Some(features) = &args.features {
        reader = reader.with_feature_columns(features);
    }
    reader.read().context("failed to read input CSV")
}

fn build_config(
    forest: &ForestArgs,
    dataset: &MixedDataset,
    classify: &[String],
    seed: u64,
) -> Result<MixedForestConfig> {
    let classification_targets = classify.iter().filter_map(|name| dataset.target_index(name));
    Ok(MixedForestConfig::new(forest.n_trees)?
        .with_max_features(parse_max_features(&forest.max_features)?)
        .with_min_samples_leaf(forest.min_samples_leaf)
        .with_choose_split(parse_choose_split(&forest.choose_split)?)
        .with_histogram_bins(forest.histogram_bins)
        .with_classification_targets(classification_targets)
        .with_seed(seed))
}

fn target_outputs(names: &[String], kinds: &[TargetKind]) -> Vec<TargetOutput> {
    names
        .iter()
        .zip(kinds)
        .map(|(name, &kind)| TargetOutput {
            name: name.clone(),
            kind,
        })
        .collect()
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Configure Rayon thread pool
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Fit {
            data,
            forest,
            experiment,
            output_dir,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;

            // 1. Read dataset
            let dataset = read_training_data(&data)?;

            // 2. Train on all rows
            let config = build_config(&forest, &dataset, &data.classify, cli.seed)?;
            let model = config
                .fit(dataset.features(), dataset.targets())
                .context("forest training failed")?;

            // 3. Write importances
            let ranked = model.ranked_importances(dataset.feature_names());
            let names: Vec<String> = ranked.iter().map(|f| f.name.clone()).collect();
            let importances: Vec<f64> = ranked.iter().map(|f| f.importance).collect();
            let ranks: Vec<usize> = ranked.iter().map(|f| f.rank).collect();

            let writer = ResultWriter::new(&output_dir, experiment_name)?;
            writer.write_importances(&names, &importances, &ranks)?;

            // 4. Save model
            let targets = target_outputs(dataset.target_names(), model.target_kinds());
            let n_trees = model.n_trees();
            SavedModel::new(
                model,
                dataset.feature_names().to_vec(),
                dataset.target_names().to_vec(),
            )?
            .save(writer.model_path())
            .context("failed to save model")?;
            info!(path = %writer.model_path().display(), "model saved");

            // 5. Print summary
            let output = FitOutput {
                experiment,
                n_samples: dataset.n_samples(),
                n_features: dataset.n_features(),
                n_trees,
                targets,
                top_feature: names.into_iter().next(),
                model_path: writer.model_path(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Evaluate {
            data,
            forest,
            cv_folds,
            experiment,
            output_dir,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;

            // 1. Read dataset
            let dataset = read_training_data(&data)?;

            // 2. Cross-validate
            let config = build_config(&forest, &dataset, &data.classify, cli.seed)?;
            let cv_result = CrossValidation::new(cv_folds)?
                .with_seed(cli.seed)
                .evaluate(&config, dataset.features(), dataset.targets())
                .context("cross-validation failed")?;

            // 3. Write evaluation JSON
            let records: Vec<TargetScoreRecord<'_>> = cv_result
                .scores
                .iter()
                .map(|s| TargetScoreRecord {
                    name: &dataset.target_names()[s.target_index],
                    kind: kind_name(s.kind),
                    metric: metric_name(s.kind),
                    pooled: s.pooled,
                    mean: s.mean,
                    std: s.std,
                    fold_scores: &s.fold_scores,
                })
                .collect();

            let writer = ResultWriter::new(&output_dir, experiment_name)?;
            writer.write_evaluation(cv_result.n_folds, cv_result.n_samples, &records)?;

            // 4. Print summary
            let output = EvaluateOutput {
                experiment,
                n_samples: cv_result.n_samples,
                n_folds: cv_result.n_folds,
                n_trees: config.n_estimators(),
                scores: records
                    .iter()
                    .map(|r| ScoreOutput {
                        target: r.name.to_string(),
                        metric: r.metric,
                        pooled: r.pooled,
                        mean: r.mean,
                        std: r.std,
                    })
                    .collect(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Predict {
            model,
            data,
            top_k,
            experiment,
            output_dir,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;

            // 1. Load model
            let saved = SavedModel::load(&model).context("failed to load model")?;
            let forest = saved.forest();
            info!(
                n_trees = forest.n_trees(),
                n_features = forest.n_features(),
                n_targets = forest.n_targets(),
                "model loaded"
            );

            // 2. Read samples in the model's feature order
            let dataset = DatasetReader::new(&data)
                .with_feature_columns(saved.feature_names())
                .read()
                .context("failed to read input CSV")?;

            // 3. Predict
            let probas = forest
                .predict_proba(dataset.features())
                .context("prediction failed")?;

            // 4. Build prediction entries
            let rows: Vec<Vec<TargetPrediction>> = probas
                .iter()
                .map(|proba| {
                    proba
                        .iter()
                        .map(|p| TargetPrediction {
                            value: p.value(),
                            probabilities: match p {
                                TargetProba::Classes(dist) => {
                                    Some(dist.top_k(top_k.unwrap_or(dist.labels().len())))
                                }
                                TargetProba::Mean(_) => None,
                            },
                        })
                        .collect()
                })
                .collect();

            // 5. Write predictions JSON
            let writer = ResultWriter::new(&output_dir, experiment_name)?;
            writer.write_predictions(saved.target_names(), dataset.sample_ids(), &rows)?;

            // 6. Print summary
            let output = PredictOutput {
                experiment,
                n_samples: dataset.n_samples(),
                model_n_trees: forest.n_trees(),
                model_n_features: forest.n_features(),
                targets: target_outputs(saved.target_names(), forest.target_kinds()),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
