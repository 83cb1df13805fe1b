use std::collections::BTreeMap;
use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize};

/// Column vocabulary understood by the trained classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FeatureKey {
    #[serde(rename = "bc_open_to_buy")]
    BcOpenToBuy,
    #[serde(rename = "revol_util")]
    RevolUtil,
    #[serde(rename = "pct_tl_nvr_dlq")]
    PctTlNvrDlq,
    #[serde(rename = "number_of_derogatory_records")]
    DerogatoryRecords,
    #[serde(rename = "number_of_collections")]
    Collections,
    #[serde(rename = "mo_sin_old_rev_tl_op")]
    MonthsSinceOldestRevolving,
    #[serde(rename = "num_actv_rev_tl")]
    ActiveRevolvingTrades,
    #[serde(rename = "total_credit_limit")]
    TotalCreditLimit,
    #[serde(rename = "accounts_with_75_percent_limit")]
    AccountsOver75PercentLimit,
    #[serde(rename = "credits_overdue_120_days")]
    CreditsOverdue120Days,
    #[serde(rename = "mo_sin_rcnt_rev_tl_op")]
    MonthsSinceRecentRevolving,
    #[serde(rename = "total_accounts")]
    TotalAccounts,
    #[serde(rename = "mo_sin_old_il_acct")]
    MonthsSinceOldestInstallment,
    #[serde(rename = "credits_taken_last_2_years")]
    CreditsTakenLast2Years,
    #[serde(rename = "total_il_high_credit_limit")]
    InstallmentHighCreditLimit,
    #[serde(rename = "bc_util")]
    BcUtil,
    #[serde(rename = "monthly_debt_payments")]
    MonthlyDebtPayments,
    #[serde(rename = "avg_cur_bal")]
    AverageCurrentBalance,
    #[serde(rename = "total_income")]
    TotalIncome,
    #[serde(rename = "credits_overdue_30_days")]
    CreditsOverdue30Days,
    #[serde(rename = "home_ownership_RENT")]
    HomeOwnershipRent,
    #[serde(rename = "home_ownership_MORTGAGE")]
    HomeOwnershipMortgage,
    #[serde(rename = "home_ownership_OWN")]
    HomeOwnershipOwn,
    #[serde(rename = "home_ownership_ANY")]
    HomeOwnershipAny,
    #[serde(rename = "home_ownership_OTHER")]
    HomeOwnershipOther,
    #[serde(rename = "home_ownership_NONE")]
    HomeOwnershipNone,
}

/// Positional layout of the classifier input vector and its importance vector.
///
/// The trained model consumes features in exactly this order; every artifact is checked
/// against it at load time.
pub const MODEL_FEATURE_ORDER: [FeatureKey; 26] = [
    FeatureKey::BcOpenToBuy,
    FeatureKey::RevolUtil,
    FeatureKey::PctTlNvrDlq,
    FeatureKey::DerogatoryRecords,
    FeatureKey::Collections,
    FeatureKey::MonthsSinceOldestRevolving,
    FeatureKey::ActiveRevolvingTrades,
    FeatureKey::TotalCreditLimit,
    FeatureKey::AccountsOver75PercentLimit,
    FeatureKey::CreditsOverdue120Days,
    FeatureKey::MonthsSinceRecentRevolving,
    FeatureKey::TotalAccounts,
    FeatureKey::MonthsSinceOldestInstallment,
    FeatureKey::CreditsTakenLast2Years,
    FeatureKey::InstallmentHighCreditLimit,
    FeatureKey::BcUtil,
    FeatureKey::MonthlyDebtPayments,
    FeatureKey::AverageCurrentBalance,
    FeatureKey::TotalIncome,
    FeatureKey::CreditsOverdue30Days,
    FeatureKey::HomeOwnershipRent,
    FeatureKey::HomeOwnershipMortgage,
    FeatureKey::HomeOwnershipOwn,
    FeatureKey::HomeOwnershipAny,
    FeatureKey::HomeOwnershipOther,
    FeatureKey::HomeOwnershipNone,
];

impl FeatureKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureKey::BcOpenToBuy => "bc_open_to_buy",
            FeatureKey::RevolUtil => "revol_util",
            FeatureKey::PctTlNvrDlq => "pct_tl_nvr_dlq",
            FeatureKey::DerogatoryRecords => "number_of_derogatory_records",
            FeatureKey::Collections => "number_of_collections",
            FeatureKey::MonthsSinceOldestRevolving => "mo_sin_old_rev_tl_op",
            FeatureKey::ActiveRevolvingTrades => "num_actv_rev_tl",
            FeatureKey::TotalCreditLimit => "total_credit_limit",
            FeatureKey::AccountsOver75PercentLimit => "accounts_with_75_percent_limit",
            FeatureKey::CreditsOverdue120Days => "credits_overdue_120_days",
            FeatureKey::MonthsSinceRecentRevolving => "mo_sin_rcnt_rev_tl_op",
            FeatureKey::TotalAccounts => "total_accounts",
            FeatureKey::MonthsSinceOldestInstallment => "mo_sin_old_il_acct",
            FeatureKey::CreditsTakenLast2Years => "credits_taken_last_2_years",
            FeatureKey::InstallmentHighCreditLimit => "total_il_high_credit_limit",
            FeatureKey::BcUtil => "bc_util",
            FeatureKey::MonthlyDebtPayments => "monthly_debt_payments",
            FeatureKey::AverageCurrentBalance => "avg_cur_bal",
            FeatureKey::TotalIncome => "total_income",
            FeatureKey::CreditsOverdue30Days => "credits_overdue_30_days",
            FeatureKey::HomeOwnershipRent => "home_ownership_RENT",
            FeatureKey::HomeOwnershipMortgage => "home_ownership_MORTGAGE",
            FeatureKey::HomeOwnershipOwn => "home_ownership_OWN",
            FeatureKey::HomeOwnershipAny => "home_ownership_ANY",
            FeatureKey::HomeOwnershipOther => "home_ownership_OTHER",
            FeatureKey::HomeOwnershipNone => "home_ownership_NONE",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        MODEL_FEATURE_ORDER
            .iter()
            .copied()
            .find(|key| key.as_str() == name)
    }
}

impl fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Profile fields denominated in currency and converted before feature construction.
pub const CURRENCY_FIELDS: [&str; 6] = [
    "total_credit_limit",
    "used_credit_amount",
    "available_credit_limit",
    "total_card_balance",
    "total_income",
    "monthly_debt_payments",
];

/// Borrower financial profile as submitted by API callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorrowerProfile {
    pub total_credit_limit: f64,
    pub used_credit_amount: f64,
    pub available_credit_limit: f64,
    #[serde(deserialize_with = "whole_count")]
    pub accounts_with_late_payments: u32,
    #[serde(deserialize_with = "whole_count")]
    pub total_accounts: u32,
    #[serde(deserialize_with = "whole_count")]
    pub number_of_derogatory_records: u32,
    #[serde(deserialize_with = "whole_count")]
    pub number_of_collections: u32,
    #[serde(deserialize_with = "whole_count")]
    pub months_since_first_credit: u32,
    #[serde(deserialize_with = "whole_count")]
    pub accounts_with_75_percent_limit: u32,
    #[serde(deserialize_with = "whole_count")]
    pub credits_overdue_120_days: u32,
    #[serde(deserialize_with = "whole_count")]
    pub total_taken_credits: u32,
    #[serde(deserialize_with = "whole_count")]
    pub credits_taken_last_2_years: u32,
    pub total_card_balance: f64,
    pub total_income: f64,
    pub monthly_debt_payments: f64,
    #[serde(deserialize_with = "whole_count")]
    pub credits_overdue_30_days: u32,
    #[serde(default, rename = "home_ownership_RENT")]
    pub home_ownership_rent: bool,
    #[serde(default, rename = "home_ownership_MORTGAGE")]
    pub home_ownership_mortgage: bool,
    #[serde(default, rename = "home_ownership_OWN")]
    pub home_ownership_own: bool,
    #[serde(default, rename = "home_ownership_ANY")]
    pub home_ownership_any: bool,
    #[serde(default, rename = "home_ownership_OTHER")]
    pub home_ownership_other: bool,
    #[serde(default, rename = "home_ownership_NONE")]
    pub home_ownership_none: bool,
}

impl BorrowerProfile {
    /// Reject profiles the derived features cannot be computed from.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in self.currency_amounts() {
            if !value.is_finite() {
                return Err(ValidationError::NotFinite { field });
            }
            if value < 0.0 {
                return Err(ValidationError::Negative { field, value });
            }
        }

        if self.total_accounts < 1 {
            return Err(ValidationError::NoAccounts);
        }

        Ok(())
    }

    pub fn currency_amounts(&self) -> [(&'static str, f64); 6] {
        [
            (CURRENCY_FIELDS[0], self.total_credit_limit),
            (CURRENCY_FIELDS[1], self.used_credit_amount),
            (CURRENCY_FIELDS[2], self.available_credit_limit),
            (CURRENCY_FIELDS[3], self.total_card_balance),
            (CURRENCY_FIELDS[4], self.total_income),
            (CURRENCY_FIELDS[5], self.monthly_debt_payments),
        ]
    }

    pub(crate) fn currency_amounts_mut(&mut self) -> [&mut f64; 6] {
        [
            &mut self.total_credit_limit,
            &mut self.used_credit_amount,
            &mut self.available_credit_limit,
            &mut self.total_card_balance,
            &mut self.total_income,
            &mut self.monthly_debt_payments,
        ]
    }
}

/// Counts arrive as JSON numbers; integral floats such as `2.0` are accepted.
fn whole_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Integer(u32),
        Float(f64),
    }

    match Count::deserialize(deserializer)? {
        Count::Integer(value) => Ok(value),
        Count::Float(value)
            if value.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&value) =>
        {
            Ok(value as u32)
        }
        Count::Float(value) => Err(de::Error::custom(format!(
            "expected a non-negative whole number, got {value}"
        ))),
    }
}

/// Input rejected before it reaches the classifier or the analyzer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: f64 },
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
    #[error("total_accounts must be at least 1")]
    NoAccounts,
}

/// How utilization ratios are scaled before they reach the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatioScaling {
    /// `trunc(ratio) * 100`: sub-unit ratios collapse to zero.
    #[default]
    TruncatedPercent,
    /// `trunc(ratio * 100)`.
    Percent,
    Raw,
}

impl RatioScaling {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "truncated_percent" | "truncated" => Some(Self::TruncatedPercent),
            "percent" => Some(Self::Percent),
            "raw" | "ratio" => Some(Self::Raw),
            _ => None,
        }
    }

    pub fn apply(self, ratio: f64) -> f64 {
        match self {
            RatioScaling::TruncatedPercent => ratio.trunc() * 100.0,
            RatioScaling::Percent => (ratio * 100.0).trunc(),
            RatioScaling::Raw => ratio,
        }
    }
}

/// Current value per feature for one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureValues(BTreeMap<FeatureKey, f64>);

impl FeatureValues {
    pub fn get(&self, key: FeatureKey) -> Option<f64> {
        self.0.get(&key).copied()
    }

    pub fn insert(&mut self, key: FeatureKey, value: f64) {
        self.0.insert(key, value);
    }

    pub fn remove(&mut self, key: FeatureKey) -> Option<f64> {
        self.0.remove(&key)
    }

}

impl FromIterator<(FeatureKey, f64)> for FeatureValues {
    fn from_iter<T: IntoIterator<Item = (FeatureKey, f64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Fully derived feature set ready for inference and analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInput {
    values: FeatureValues,
}

impl ModelInput {
    pub fn derive(profile: &BorrowerProfile, scaling: RatioScaling) -> Self {
        let accounts = f64::from(profile.total_accounts);
        let months = f64::from(profile.months_since_first_credit);
        let utilization = if profile.total_credit_limit != 0.0 {
            profile.used_credit_amount / profile.total_credit_limit
        } else {
            1e-6
        };
        let utilization = scaling.apply(utilization);
        let flag = |set: bool| if set { 1.0 } else { 0.0 };

        let values = MODEL_FEATURE_ORDER
            .iter()
            .map(|&key| {
                let value = match key {
                    FeatureKey::BcOpenToBuy => {
                        profile.total_credit_limit - profile.used_credit_amount
                    }
                    FeatureKey::RevolUtil | FeatureKey::BcUtil => utilization,
                    FeatureKey::PctTlNvrDlq => {
                        f64::from(profile.accounts_with_late_payments) / accounts
                    }
                    FeatureKey::DerogatoryRecords => {
                        f64::from(profile.number_of_derogatory_records)
                    }
                    FeatureKey::Collections => f64::from(profile.number_of_collections),
                    FeatureKey::MonthsSinceOldestRevolving
                    | FeatureKey::MonthsSinceRecentRevolving
                    | FeatureKey::MonthsSinceOldestInstallment => months,
                    FeatureKey::ActiveRevolvingTrades | FeatureKey::TotalAccounts => accounts,
                    FeatureKey::TotalCreditLimit | FeatureKey::InstallmentHighCreditLimit => {
                        profile.total_credit_limit
                    }
                    FeatureKey::AccountsOver75PercentLimit => {
                        f64::from(profile.accounts_with_75_percent_limit)
                    }
                    FeatureKey::CreditsOverdue120Days => {
                        f64::from(profile.credits_overdue_120_days)
                    }
                    FeatureKey::CreditsTakenLast2Years => {
                        f64::from(profile.credits_taken_last_2_years)
                    }
                    FeatureKey::MonthlyDebtPayments => profile.monthly_debt_payments,
                    FeatureKey::AverageCurrentBalance => profile.total_card_balance / accounts,
                    FeatureKey::TotalIncome => profile.total_income,
                    FeatureKey::CreditsOverdue30Days => f64::from(profile.credits_overdue_30_days),
                    FeatureKey::HomeOwnershipRent => flag(profile.home_ownership_rent),
                    FeatureKey::HomeOwnershipMortgage => flag(profile.home_ownership_mortgage),
                    FeatureKey::HomeOwnershipOwn => flag(profile.home_ownership_own),
                    FeatureKey::HomeOwnershipAny => flag(profile.home_ownership_any),
                    FeatureKey::HomeOwnershipOther => flag(profile.home_ownership_other),
                    FeatureKey::HomeOwnershipNone => flag(profile.home_ownership_none),
                };
                (key, value)
            })
            .collect();

        Self { values }
    }

    pub fn values(&self) -> &FeatureValues {
        &self.values
    }

    /// Classifier input laid out in [`MODEL_FEATURE_ORDER`].
    pub fn vector(&self) -> Vec<f64> {
        MODEL_FEATURE_ORDER
            .iter()
            .map(|&key| self.values.get(key).unwrap_or(f64::NAN))
            .collect()
    }
}
