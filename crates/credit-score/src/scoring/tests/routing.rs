use super::common::*;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::scoring::{scoring_router, FeatureKey};

fn json_request(uri: &str, payload: &Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(payload).expect("payload serializes")))
        .expect("request builds")
}

fn profile_json() -> Value {
    serde_json::to_value(profile()).expect("profile serializes")
}

#[tokio::test]
async fn predict_route_returns_score_and_ranked_advice() {
    let router = scoring_router(Arc::new(service(
        640.0,
        &[
            (FeatureKey::TotalIncome, 0.10),
            (FeatureKey::PctTlNvrDlq, 0.20),
        ],
        1.0,
    )));

    let response = router
        .oneshot(json_request("/predict", &profile_json()))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["prediction"], json!(640));
    let recommendations = payload["recommendations"]
        .as_array()
        .expect("ranked recommendations");
    assert_eq!(recommendations.len(), 2);
    assert_eq!(
        recommendations[0]["feat_name"],
        "Share of accounts never delinquent"
    );
    assert_eq!(recommendations[1]["feat_name"], "Total income");
}

#[tokio::test]
async fn recommend_route_returns_sentinel_for_healthy_profiles() {
    let router = scoring_router(Arc::new(service(
        760.0,
        &[(FeatureKey::TotalIncome, 0.10)],
        0.5,
    )));

    let response = router
        .oneshot(json_request("/recommend", &profile_json()))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert!(payload["message"].is_string());
    assert!(payload.get("prediction").is_none());
}

#[tokio::test]
async fn invalid_profile_is_unprocessable() {
    let router = scoring_router(Arc::new(service(
        700.0,
        &[(FeatureKey::TotalIncome, 0.10)],
        1.0,
    )));
    let mut payload = profile_json();
    payload["total_accounts"] = json!(0);

    let response = router
        .oneshot(json_request("/predict", &payload))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert_eq!(body["error"], "total_accounts must be at least 1");
}

#[tokio::test]
async fn missing_fields_are_rejected_by_the_extractor() {
    let router = scoring_router(Arc::new(service(
        700.0,
        &[(FeatureKey::TotalIncome, 0.10)],
        1.0,
    )));
    let mut payload = profile_json();
    payload
        .as_object_mut()
        .expect("object payload")
        .remove("total_income");

    let response = router
        .oneshot(json_request("/recommend", &payload))
        .await
        .expect("route executes");

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn currency_outage_maps_to_bad_gateway() {
    let router = scoring_router(Arc::new(unavailable_rate_service(&[(
        FeatureKey::TotalIncome,
        0.10,
    )])));

    let response = router
        .oneshot(json_request("/predict", &profile_json()))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = read_json_body(response).await;
    assert!(body["error"]
        .as_str()
        .expect("error message")
        .starts_with("currency conversion unavailable"));
}

#[tokio::test]
async fn advice_route_maps_score_bands() {
    let router = scoring_router(Arc::new(service(
        700.0,
        &[(FeatureKey::TotalIncome, 0.10)],
        1.0,
    )));

    let response = router
        .oneshot(json_request("/advice", &json!(650.0)))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(
        body["recommendation"],
        "You should apply for a loan with caution"
    );
}
