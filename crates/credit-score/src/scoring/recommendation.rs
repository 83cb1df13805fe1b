use serde::{Deserialize, Serialize};

use super::catalog::{FeatureCatalog, FeatureConfig};
use super::features::FeatureKey;
use super::impact::impact;
use super::ScoringError;

/// Features the model weighs at or below this importance never produce advice.
pub const RELEVANCE_THRESHOLD: f64 = 0.05;

/// Advice for a single feature, ranked by `impact` within a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(rename = "feat_name")]
    pub feature_label: String,
    pub current_value: i64,
    pub target_value: i64,
    pub importance: f64,
    pub impact: f64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotNeedImprovement {
    pub message: String,
}

/// Either ranked advice or the encouragement returned when nothing qualifies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecommendationResult {
    Ranked(Vec<Recommendation>),
    NotNeeded(NotNeedImprovement),
}

impl RecommendationResult {
    pub fn recommendations(&self) -> &[Recommendation] {
        match self {
            RecommendationResult::Ranked(items) => items,
            RecommendationResult::NotNeeded(_) => &[],
        }
    }

    pub fn is_not_needed(&self) -> bool {
        matches!(self, RecommendationResult::NotNeeded(_))
    }
}

/// Decides whether a single feature deserves advice and renders it.
pub struct RecommendationBuilder<'a> {
    catalog: &'a FeatureCatalog,
}

impl<'a> RecommendationBuilder<'a> {
    pub fn new(catalog: &'a FeatureCatalog) -> Self {
        Self { catalog }
    }

    pub fn build(
        &self,
        key: FeatureKey,
        current: f64,
        importance: f64,
    ) -> Result<Option<Recommendation>, ScoringError> {
        let Some(config) = self.catalog.lookup(key) else {
            return Ok(None);
        };

        if !needs_improvement(config, current) || importance <= RELEVANCE_THRESHOLD {
            return Ok(None);
        }

        let band = config.threshold;
        let impact = impact(key, current, band.good, band.ceiling, importance)?;
        let current_value = current.trunc() as i64;
        let target_value = band.good.trunc() as i64;

        Ok(Some(Recommendation {
            feature_label: config.display_name.clone(),
            current_value,
            target_value,
            importance,
            impact,
            message: self.message(key, config, current_value, target_value),
        }))
    }

    fn message(
        &self,
        key: FeatureKey,
        config: &FeatureConfig,
        current: i64,
        target: i64,
    ) -> String {
        let templates = self.catalog.templates();

        if !config.status.can_improve {
            return format!("{} {}", templates.cannot_improve, config.explanation);
        }

        if self.catalog.is_special(key) {
            return config.explanation.clone();
        }

        let verb = if config.status.is_negative {
            &templates.decrease
        } else {
            &templates.increase
        };
        format!(
            "{verb} «{}»: {current} → {target}. {}",
            config.display_name, config.explanation
        )
    }
}

fn needs_improvement(config: &FeatureConfig, current: f64) -> bool {
    if config.status.is_negative {
        current > config.threshold.good
    } else {
        current < config.threshold.good
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> FeatureCatalog {
        FeatureCatalog::english().expect("catalog")
    }

    #[test]
    fn positive_feature_below_threshold_gets_increase_advice() {
        let catalog = catalog();
        let builder = RecommendationBuilder::new(&catalog);

        let rec = builder
            .build(FeatureKey::TotalIncome, 50000.0, 0.10)
            .expect("builds")
            .expect("income needs improvement");

        assert_eq!(rec.feature_label, "Total income");
        assert_eq!(rec.current_value, 50000);
        assert_eq!(rec.target_value, 77992);
        assert!(rec.message.starts_with("Increase «Total income»: 50000 → 77992."));
        assert!(rec.impact > 0.0);
    }

    #[test]
    fn negative_feature_above_threshold_gets_decrease_advice() {
        let catalog = catalog();
        let builder = RecommendationBuilder::new(&catalog);

        let rec = builder
            .build(FeatureKey::CreditsOverdue30Days, 2.0, 0.2)
            .expect("builds")
            .expect("overdue needs improvement");

        assert!(rec.message.starts_with("Decrease"));
        assert_eq!(rec.target_value, 0);
        assert!(rec.impact < 0.0);
    }

    #[test]
    fn negative_feature_at_zero_is_left_alone() {
        let catalog = catalog();
        let builder = RecommendationBuilder::new(&catalog);
        let rec = builder
            .build(FeatureKey::CreditsOverdue120Days, 0.0, 0.9)
            .expect("builds");
        assert!(rec.is_none());
    }

    #[test]
    fn low_importance_suppresses_advice() {
        let catalog = catalog();
        let builder = RecommendationBuilder::new(&catalog);
        assert!(builder
            .build(FeatureKey::TotalIncome, 100.0, 0.04)
            .expect("builds")
            .is_none());
        assert!(builder
            .build(FeatureKey::TotalIncome, 100.0, RELEVANCE_THRESHOLD)
            .expect("builds")
            .is_none());
    }

    #[test]
    fn unimprovable_feature_carries_disclaimer() {
        let catalog = catalog();
        let builder = RecommendationBuilder::new(&catalog);
        let rec = builder
            .build(FeatureKey::MonthsSinceOldestRevolving, 24.0, 0.3)
            .expect("builds")
            .expect("short history flagged");
        assert_eq!(
            rec.message,
            "This indicator cannot be improved in the near term. A long credit history only builds with time; keep old accounts open."
        );
    }

    #[test]
    fn default_ukrainian_catalog_renders_localized_advice() {
        let catalog = FeatureCatalog::ukrainian().expect("catalog");
        let builder = RecommendationBuilder::new(&catalog);

        let income = builder
            .build(FeatureKey::TotalIncome, 50000.0, 0.10)
            .expect("builds")
            .expect("income needs improvement");
        assert_eq!(income.feature_label, "Загальний дохід");
        assert_eq!(
            income.message,
            "Збільшіть «Загальний дохід»: 50000 → 77992. \
             Людям з вищим підтвердженим доходом частіше схвалюють кредити."
        );

        let derogatory = builder
            .build(FeatureKey::DerogatoryRecords, 2.0, 0.10)
            .expect("builds")
            .expect("derogatory records flagged");
        assert_eq!(
            derogatory.message,
            "Цей показник неможливо покращити найближчим часом. \
             Негативні записи залишаються в кредитній історії протягом кількох років."
        );
    }

    #[test]
    fn special_feature_uses_bare_explanation() {
        let catalog = catalog();
        let builder = RecommendationBuilder::new(&catalog);
        let rec = builder
            .build(FeatureKey::HomeOwnershipRent, 1.0, 0.2)
            .expect("builds")
            .expect("renting flagged");
        assert_eq!(
            rec.message,
            "Borrowers who rent their home are approved less often."
        );
        assert_eq!(rec.feature_label, "Renting");
    }

    #[test]
    fn values_are_truncated_not_rounded() {
        let catalog = catalog();
        let builder = RecommendationBuilder::new(&catalog);
        let rec = builder
            .build(FeatureKey::AverageCurrentBalance, 999.99, 0.2)
            .expect("builds")
            .expect("balance flagged");
        assert_eq!(rec.current_value, 999);
        assert_eq!(rec.target_value, 13547);
    }

    #[test]
    fn unknown_feature_is_skipped() {
        let catalog = catalog();
        let builder = RecommendationBuilder::new(&catalog);
        assert!(builder
            .build(FeatureKey::TotalAccounts, 0.0, 0.9)
            .expect("builds")
            .is_none());
    }

    #[test]
    fn recommendation_uses_original_wire_names() {
        let rec = Recommendation {
            feature_label: "Total income".to_string(),
            current_value: 1,
            target_value: 2,
            importance: 0.1,
            impact: 0.01,
            message: "m".to_string(),
        };
        let json = serde_json::to_value(&rec).expect("serializes");
        assert_eq!(json["feat_name"], "Total income");
        assert!(json.get("feature_label").is_none());

        let none = RecommendationResult::NotNeeded(NotNeedImprovement {
            message: "ok".to_string(),
        });
        assert_eq!(
            serde_json::to_value(&none).expect("serializes"),
            serde_json::json!({ "message": "ok" })
        );
    }
}
