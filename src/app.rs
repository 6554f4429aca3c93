//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - simulates the market dataset
//! - runs the training protocol
//! - loads the serving context and answers prediction/health requests

use clap::Parser;
use tracing::warn;

use crate::cli::{Command, GenerateArgs, ModelArgs, PredictArgs, TrainArgs};
use crate::domain::{
    BoosterParams, GenerateConfig, PredictionResponse, PropertyFeatures, PropertyInput, TrainConfig,
};
use crate::error::{AppError, OracleError};
use crate::serve::{PredictionOutcome, ServingContext};

pub mod pipeline;

/// Exit code for a request that was not answered with an estimate.
pub const EXIT_NOT_SERVED: u8 = 7;

/// Entry point for the `oracle` binary.
pub fn run() -> Result<(), AppError> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            warn!(error = %e, "Ignoring unreadable .env file");
        }
    }
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Generate(args) => handle_generate(args),
        Command::Train(args) => handle_train(args),
        Command::Predict(args) => handle_predict(args),
        Command::Health(args) => handle_health(args),
    }
}

fn handle_generate(args: GenerateArgs) -> Result<(), AppError> {
    let config = generate_config_from_args(&args);
    let records = crate::data::generate_market_data(config.samples, config.seed)?;
    crate::io::write_dataset(&config.output, &records)?;
    println!("{}", crate::report::format_dataset_summary(&records, &config.output));
    Ok(())
}

fn handle_train(args: TrainArgs) -> Result<(), AppError> {
    let config = train_config_from_args(&args);
    let run = crate::fit::run_training(&config)?;
    println!("{}", crate::report::format_training_summary(&run));
    Ok(())
}

fn handle_predict(args: PredictArgs) -> Result<(), AppError> {
    let context = ServingContext::load(&args.model.model)?;

    if let Some(batch) = &args.batch {
        let served = pipeline::serve_batch(&context, batch)?;
        for s in &served {
            match (&s.outcome, args.json) {
                (Ok((features, PredictionOutcome::Ready(result))), false) => {
                    println!("{:>5}: {}", s.line, crate::report::format_prediction(features, result));
                }
                _ => println!("{}", s.to_json()),
            }
        }
        let missed = served.iter().filter(|s| !s.is_ready()).count();
        if missed > 0 {
            return Err(AppError::new(
                EXIT_NOT_SERVED,
                format!("{missed} of {} requests were not served", served.len()),
            ));
        }
        return Ok(());
    }

    let features = single_request_from_args(&args)?;
    match context.predict(&features) {
        PredictionOutcome::Ready(result) if args.json => {
            let body = serde_json::to_string(&PredictionResponse::from(result))
                .map_err(|e| AppError::new(4, format!("failed to encode response: {e}")))?;
            println!("{body}");
            Ok(())
        }
        PredictionOutcome::Ready(result) => {
            println!("{}", crate::report::format_prediction(&features, &result));
            Ok(())
        }
        other => {
            let status = other.status_code();
            let detail = other.into_response().err().unwrap_or_default();
            Err(AppError::new(EXIT_NOT_SERVED, format!("{detail} ({status})")))
        }
    }
}

fn handle_health(args: ModelArgs) -> Result<(), AppError> {
    let context = ServingContext::load(&args.model)?;
    let body = serde_json::to_string(&context.health())
        .map_err(|e| AppError::new(4, format!("failed to encode health status: {e}")))?;
    println!("{body}");
    Ok(())
}

fn single_request_from_args(args: &PredictArgs) -> Result<PropertyFeatures, OracleError> {
    if let Some(body) = &args.request {
        return pipeline::parse_request(body);
    }

    let (Some(district), Some(surface_m2), Some(distance_to_metro)) = (args.district, args.surface, args.distance)
    else {
        return Err(OracleError::InvalidInput(
            "--district, --surface and --distance are required without --request/--batch".into(),
        ));
    };
    PropertyInput {
        comuna: district.display_name().to_string(),
        surface_m2,
        distance_to_metro,
    }
    .validate()
}

pub fn generate_config_from_args(args: &GenerateArgs) -> GenerateConfig {
    GenerateConfig {
        samples: args.samples,
        seed: args.seed,
        output: args.output.clone(),
    }
}

pub fn train_config_from_args(args: &TrainArgs) -> TrainConfig {
    TrainConfig {
        data_path: args.data.clone(),
        model_path: args.model.model.clone(),
        seed: args.seed,
        test_fraction: args.test_fraction,
        booster: BoosterParams {
            n_estimators: args.trees,
            max_depth: args.max_depth,
            learning_rate: args.learning_rate,
            min_leaf_size: args.min_leaf_size,
        },
        min_r_squared: args.min_r2,
        export_predictions: args.export_predictions.clone(),
    }
}
