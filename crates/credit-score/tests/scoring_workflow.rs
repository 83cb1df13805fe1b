//! End-to-end scoring through the public service facade and HTTP router, using the shipped
//! model artifact.

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use credit_score::currency::FixedRate;
use credit_score::scoring::{
    scoring_router, BorrowerProfile, Classifier, FeatureCatalog, RatioScaling,
    RecommendationResult, ScoringService, TreeEnsembleClassifier, RELEVANCE_THRESHOLD,
};
use serde_json::Value;
use tower::ServiceExt;

const UAH_PER_USD: f64 = 40.0;

fn model_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../models/credit_model.json")
}

fn build_service() -> ScoringService<TreeEnsembleClassifier> {
    let classifier = TreeEnsembleClassifier::from_path(model_path()).expect("model loads");
    ScoringService::new(
        Arc::new(classifier),
        Arc::new(FixedRate::new(UAH_PER_USD).expect("valid rate")),
        Arc::new(FeatureCatalog::english().expect("catalog")),
        RatioScaling::TruncatedPercent,
    )
}

fn thin_file_borrower() -> BorrowerProfile {
    BorrowerProfile {
        total_credit_limit: 400_000.0,
        used_credit_amount: 100_000.0,
        available_credit_limit: 300_000.0,
        accounts_with_late_payments: 0,
        total_accounts: 2,
        number_of_derogatory_records: 0,
        number_of_collections: 0,
        months_since_first_credit: 12,
        accounts_with_75_percent_limit: 0,
        credits_overdue_120_days: 0,
        total_taken_credits: 2,
        credits_taken_last_2_years: 2,
        total_card_balance: 80_000.0,
        total_income: 1_200_000.0,
        monthly_debt_payments: 400.0,
        credits_overdue_30_days: 0,
        home_ownership_rent: true,
        home_ownership_mortgage: false,
        home_ownership_own: false,
        home_ownership_any: false,
        home_ownership_other: false,
        home_ownership_none: false,
    }
}

fn established_borrower() -> BorrowerProfile {
    BorrowerProfile {
        total_credit_limit: 8_000_000.0,
        used_credit_amount: 400_000.0,
        total_card_balance: 1_600_000.0,
        total_accounts: 4,
        months_since_first_credit: 200,
        total_income: 4_000_000.0,
        home_ownership_rent: false,
        home_ownership_own: true,
        ..thin_file_borrower()
    }
}

#[test]
fn shipped_model_matches_feature_order() {
    let classifier = TreeEnsembleClassifier::from_path(model_path()).expect("model loads");
    assert_eq!(classifier.classes(), &[550.0, 620.0, 680.0, 750.0]);
    let total: f64 = classifier.feature_importances().iter().sum();
    assert!(total <= 1.0 + 1e-6);
}

#[tokio::test]
async fn thin_file_borrower_gets_ranked_advice() {
    let service = build_service();

    let response = service
        .predict(thin_file_borrower())
        .await
        .expect("prediction succeeds");

    assert_eq!(response.prediction, 620);
    let RecommendationResult::Ranked(recommendations) = &response.recommendations else {
        panic!("expected ranked advice, got {:?}", response.recommendations);
    };
    assert!(recommendations
        .iter()
        .any(|rec| rec.feature_label == "Total income" && rec.current_value == 30_000));
    assert!(recommendations
        .iter()
        .all(|rec| rec.importance > RELEVANCE_THRESHOLD));
    for pair in recommendations.windows(2) {
        assert!(pair[0].impact.abs() >= pair[1].impact.abs());
    }
}

#[tokio::test]
async fn established_borrower_scores_higher() {
    let service = build_service();

    let response = service
        .predict(established_borrower())
        .await
        .expect("prediction succeeds");

    assert_eq!(response.prediction, 750);
    assert!(response
        .recommendations
        .recommendations()
        .iter()
        .all(|rec| rec.feature_label != "Total income"));
}

#[tokio::test]
async fn predict_route_serves_shipped_model() {
    let router = scoring_router(Arc::new(build_service()));
    let body = serde_json::to_vec(&thin_file_borrower()).expect("profile serializes");

    let response = router
        .oneshot(
            Request::post("/predict")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    let payload: Value = serde_json::from_slice(&bytes).expect("json payload");
    assert_eq!(payload["prediction"], 620);
    assert!(payload["recommendations"].is_array());
}
