use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};

use super::classifier::Classifier;
use super::features::BorrowerProfile;
use super::recommendation::RecommendationResult;
use super::service::{loan_advice, LoanAdvice, PredictionResponse, ScoringService};
use crate::error::AppError;

/// Router builder exposing the scoring and recommendation endpoints.
pub fn scoring_router<C>(service: Arc<ScoringService<C>>) -> Router
where
    C: Classifier + 'static,
{
    Router::new()
        .route("/predict", post(predict_handler::<C>))
        .route("/recommend", post(recommend_handler::<C>))
        .route("/advice", post(advice_handler))
        .with_state(service)
}

pub(crate) async fn predict_handler<C>(
    State(service): State<Arc<ScoringService<C>>>,
    Json(profile): Json<BorrowerProfile>,
) -> Result<Json<PredictionResponse>, AppError>
where
    C: Classifier + 'static,
{
    let response = service.predict(profile).await?;
    Ok(Json(response))
}

pub(crate) async fn recommend_handler<C>(
    State(service): State<Arc<ScoringService<C>>>,
    Json(profile): Json<BorrowerProfile>,
) -> Result<Json<RecommendationResult>, AppError>
where
    C: Classifier + 'static,
{
    let result = service.recommend(profile).await?;
    Ok(Json(result))
}

pub(crate) async fn advice_handler(Json(prediction): Json<f64>) -> Json<LoanAdvice> {
    Json(loan_advice(prediction))
}
