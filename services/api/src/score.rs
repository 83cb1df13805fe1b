use crate::infra::{build_scoring_service, ServiceOverrides};
use clap::Args;
use credit_score::config::AppConfig;
use credit_score::error::AppError;
use credit_score::scoring::{loan_advice, BorrowerProfile, LoanAdvice, PredictionResponse};
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Borrower profile JSON (same body as POST /predict)
    #[arg(long)]
    pub(crate) profile: PathBuf,
    /// UAH per USD; skips the live exchange rate lookup
    #[arg(long)]
    pub(crate) rate: Option<f64>,
    /// Model artifact to use instead of APP_MODEL_PATH
    #[arg(long)]
    pub(crate) model: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ScoreReport {
    #[serde(flatten)]
    response: PredictionResponse,
    advice: LoanAdvice,
}

pub(crate) async fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let file = File::open(&args.profile)?;
    let profile: BorrowerProfile = serde_json::from_reader(BufReader::new(file))?;

    let service = build_scoring_service(
        &config,
        ServiceOverrides {
            model_path: args.model,
            rate: args.rate,
        },
    )?;

    let response = service.predict(profile).await?;
    let report = ScoreReport {
        advice: loan_advice(response.prediction as f64),
        response,
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
