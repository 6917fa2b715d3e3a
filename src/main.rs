//! churnflow: customer churn pipeline CLI
//!
//! Runs the extract, train and predict stages individually or in sequence.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use churnflow::cli::{Cli, Commands, ExtractArgs, PredictArgs, RunArgs, TrainArgs};
use churnflow::config::{load_env_file, DbConfig, TrainConfig};
use churnflow::pipeline::{run_extract, run_predict, run_train};
use churnflow::report::{display_extract_summary, display_predict_summary, display_train_summary};
use churnflow::utils::{
    display_path, print_banner, print_completion, print_config, print_failure, print_hints,
    print_step_header, DATABASE, FOLDER, MODEL, SAVE,
};
use churnflow::ChurnError;

const EXTRACT_HINTS: [&str; 4] = [
    "Verify the table name is correct",
    "Check the database for data",
    "Try a simpler query such as SELECT * FROM table LIMIT 10",
    "Check file permissions and whether the output file is open in another program",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Extractor,
    Trainer,
    Predictor,
}

impl Stage {
    fn name(self) -> &'static str {
        match self {
            Stage::Extractor => "Extractor",
            Stage::Trainer => "Trainer",
            Stage::Predictor => "Predictor",
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    load_env_file(&cli.env_file);

    print_banner(env!("CARGO_PKG_VERSION"));

    let outcome = match &cli.command {
        Commands::Extract(args) => extract_stage(args).map_err(|e| (Stage::Extractor, e)),
        Commands::Train(args) => train_stage(args).map_err(|e| (Stage::Trainer, e)),
        Commands::Predict(args) => predict_stage(args).map_err(|e| (Stage::Predictor, e)),
        Commands::Run(args) => run_all(args),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err((stage, err)) => {
            report_failure(stage, &err);
            if cli.strict {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
    }
}

/// Print `❌ <stage> failed: <message>`, plus troubleshooting hints for the
/// extractor.
fn report_failure(stage: Stage, err: &anyhow::Error) {
    print_failure(&format!("{} failed: {}", stage.name(), err));
    if let Some(churn) = err.downcast_ref::<ChurnError>() {
        log::debug!("{} failure category: {:?}", stage.name(), churn.category());
    }
    if stage == Stage::Extractor {
        print_hints(&EXTRACT_HINTS);
    }
}

fn extract_stage(args: &ExtractArgs) -> Result<()> {
    let db = DbConfig::from_env();
    print_config(
        "Extractor",
        &[
            (DATABASE, "Source", format!("{}@{}:{}", db.dbname, db.host, db.port)),
            (DATABASE, "Table", args.table.clone()),
            (SAVE, "Output", display_path(&args.output)),
            (FOLDER, "Batch", args.batch_size.to_string()),
        ],
    );

    print_step_header(1, "Extract Table");
    let report = run_extract(&db, &args.table, &args.output, args.batch_size)?;
    display_extract_summary(&report);
    print_completion("Extraction");
    Ok(())
}

fn train_stage(args: &TrainArgs) -> Result<()> {
    let config = args.model_options.to_train_config();
    print_train_config(&args.input, &args.model, &config);

    print_step_header(2, "Train Model");
    let report = run_train(&args.input, &args.model, &config)?;
    display_train_summary(&report);
    print_completion("Training");
    Ok(())
}

fn predict_stage(args: &PredictArgs) -> Result<()> {
    print_config(
        "Predictor",
        &[
            (FOLDER, "Input", display_path(&args.input)),
            (MODEL, "Model", display_path(&args.model)),
            (SAVE, "Output", display_path(&args.output)),
        ],
    );

    print_step_header(3, "Score Data");
    let report = run_predict(&args.input, &args.model, &args.output)?;
    display_predict_summary(&report);
    print_completion("Prediction");
    Ok(())
}

fn print_train_config(input: &std::path::Path, model: &std::path::Path, config: &TrainConfig) {
    print_config(
        "Trainer",
        &[
            (FOLDER, "Input", display_path(input)),
            (MODEL, "Model", display_path(model)),
            (
                MODEL,
                "Forest",
                format!(
                    "{} trees, depth {}, seed {}",
                    config.forest.n_trees, config.forest.max_depth, config.forest.seed
                ),
            ),
            (
                FOLDER,
                "Split",
                format!(
                    "test {:.0}%, resample {}",
                    config.test_size * 100.0,
                    if config.resample { "on" } else { "off" }
                ),
            ),
        ],
    );
}

/// All three stages in order; a failing stage stops the run.
fn run_all(args: &RunArgs) -> std::result::Result<(), (Stage, anyhow::Error)> {
    let extract = ExtractArgs {
        table: args.table.clone(),
        output: args.data.clone(),
        batch_size: args.batch_size,
    };
    extract_stage(&extract).map_err(|e| (Stage::Extractor, e))?;

    let train = TrainArgs {
        input: args.data.clone(),
        model: args.model.clone(),
        model_options: args.model_options.clone(),
    };
    train_stage(&train).map_err(|e| (Stage::Trainer, e))?;

    let predict = PredictArgs {
        input: args.data.clone(),
        model: args.model.clone(),
        output: args.output.clone(),
    };
    predict_stage(&predict).map_err(|e| (Stage::Predictor, e))?;
    Ok(())
}
