use std::sync::Arc;

use tracing::debug;

use super::catalog::FeatureCatalog;
use super::classifier::{importance_pairs, Classifier};
use super::features::FeatureValues;
use super::recommendation::{NotNeedImprovement, RecommendationBuilder, RecommendationResult};
use super::ScoringError;

/// Stateless pass over the model's importance vector producing ranked advice.
pub struct FeatureAnalyzer<C> {
    catalog: Arc<FeatureCatalog>,
    classifier: Arc<C>,
}

impl<C> FeatureAnalyzer<C>
where
    C: Classifier,
{
    pub fn new(catalog: Arc<FeatureCatalog>, classifier: Arc<C>) -> Self {
        Self {
            catalog,
            classifier,
        }
    }

    pub fn analyze(&self, values: &FeatureValues) -> Result<RecommendationResult, ScoringError> {
        let builder = RecommendationBuilder::new(&self.catalog);
        let mut recommendations = Vec::new();

        for (key, importance) in importance_pairs(self.classifier.feature_importances()) {
            if self.catalog.lookup(key).is_none() {
                continue;
            }
            let current = values.get(key).ok_or(ScoringError::MissingFeature(key))?;
            if let Some(recommendation) = builder.build(key, current, importance)? {
                recommendations.push(recommendation);
            }
        }

        debug!(count = recommendations.len(), "feature analysis complete");

        if recommendations.is_empty() {
            return Ok(RecommendationResult::NotNeeded(NotNeedImprovement {
                message: self.catalog.templates().no_improvement_needed.clone(),
            }));
        }

        // Stable sort keeps model order among equal impacts.
        recommendations.sort_by(|a, b| b.impact.abs().total_cmp(&a.impact.abs()));
        Ok(RecommendationResult::Ranked(recommendations))
    }
}
