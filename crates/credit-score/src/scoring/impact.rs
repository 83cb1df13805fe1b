use super::ScoringError;
use super::features::FeatureKey;

/// Importance-weighted, normalized gap between the good threshold and the current value.
///
/// Positive when the threshold lies above the current value. A zero or non-finite ceiling is
/// rejected rather than producing an infinite or NaN impact.
pub fn impact(
    feature: FeatureKey,
    current: f64,
    good: f64,
    ceiling: f64,
    importance: f64,
) -> Result<f64, ScoringError> {
    if ceiling == 0.0 || !ceiling.is_finite() {
        return Err(ScoringError::InvalidCeiling { feature, ceiling });
    }
    Ok(((good - current) / ceiling) * importance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn income_gap_is_weighted_by_importance() {
        let value = impact(FeatureKey::TotalIncome, 50000.0, 77992.42, 110000000.0, 0.10)
            .expect("valid ceiling");
        let expected = ((77992.42 - 50000.0) / 110000000.0) * 0.10;
        assert!((value - expected).abs() < 1e-15);
        assert!((value - 0.0000254).abs() < 1e-7);
    }

    #[test]
    fn sign_follows_threshold_gap() {
        let above = impact(FeatureKey::CreditsOverdue30Days, 3.0, 0.31, 58.0, 0.2).expect("ok");
        assert!(above < 0.0);
        let below = impact(FeatureKey::TotalIncome, 10.0, 20.0, 100.0, 0.2).expect("ok");
        assert!(below > 0.0);
        let zero_weight = impact(FeatureKey::TotalIncome, 10.0, 20.0, 100.0, 0.0).expect("ok");
        assert_eq!(zero_weight, 0.0);
    }

    #[test]
    fn zero_ceiling_fails_loudly() {
        match impact(FeatureKey::BcUtil, 1.0, 2.0, 0.0, 0.3) {
            Err(ScoringError::InvalidCeiling { feature, ceiling }) => {
                assert_eq!(feature, FeatureKey::BcUtil);
                assert_eq!(ceiling, 0.0);
            }
            other => panic!("expected invalid ceiling, got {other:?}"),
        }
        assert!(impact(FeatureKey::BcUtil, 1.0, 2.0, f64::NAN, 0.3).is_err());
    }
}
