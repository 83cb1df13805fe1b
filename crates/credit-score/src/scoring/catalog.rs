use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::features::FeatureKey;
use crate::config::CatalogConfig;

/// Direction and actionability of a tracked feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureStatus {
    #[serde(default = "default_can_improve")]
    pub can_improve: bool,
    #[serde(default)]
    pub is_negative: bool,
}

fn default_can_improve() -> bool {
    true
}

impl Default for FeatureStatus {
    fn default() -> Self {
        Self {
            can_improve: true,
            is_negative: false,
        }
    }
}

/// `(good, ceiling)` pair judging and normalizing a feature value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct ThresholdBand {
    pub good: f64,
    pub ceiling: f64,
}

impl From<(f64, f64)> for ThresholdBand {
    fn from((good, ceiling): (f64, f64)) -> Self {
        Self { good, ceiling }
    }
}

impl From<ThresholdBand> for (f64, f64) {
    fn from(band: ThresholdBand) -> Self {
        (band.good, band.ceiling)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    pub threshold: ThresholdBand,
    pub display_name: String,
    pub explanation: String,
    #[serde(default)]
    pub status: FeatureStatus,
}

/// Localized phrases wrapped around per-feature explanations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageTemplates {
    pub increase: String,
    pub decrease: String,
    pub cannot_improve: String,
    pub no_improvement_needed: String,
}

/// Language of the built-in catalogs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    Ukrainian,
    English,
}

impl Locale {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "uk" | "ua" | "uk-ua" | "ukrainian" => Some(Self::Ukrainian),
            "en" | "en-us" | "english" => Some(Self::English),
            _ => None,
        }
    }

    pub fn catalog(self) -> Result<FeatureCatalog, CatalogError> {
        match self {
            Locale::Ukrainian => FeatureCatalog::ukrainian(),
            Locale::English => FeatureCatalog::english(),
        }
    }
}

/// Immutable lookup table from feature key to its threshold band and advice text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCatalog {
    templates: MessageTemplates,
    #[serde(default)]
    special_features: BTreeSet<FeatureKey>,
    features: BTreeMap<FeatureKey, FeatureConfig>,
}

impl FeatureCatalog {
    pub fn new(
        templates: MessageTemplates,
        features: BTreeMap<FeatureKey, FeatureConfig>,
        special_features: BTreeSet<FeatureKey>,
    ) -> Result<Self, CatalogError> {
        let catalog = Self {
            templates,
            special_features,
            features,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn load(config: &CatalogConfig) -> Result<Self, CatalogError> {
        match &config.path {
            Some(path) => Self::from_path(path),
            None => config.locale.catalog(),
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_reader(reader)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn lookup(&self, key: FeatureKey) -> Option<&FeatureConfig> {
        self.features.get(&key)
    }

    /// Ownership-style features whose advice is the explanation alone.
    pub fn is_special(&self, key: FeatureKey) -> bool {
        self.special_features.contains(&key)
    }

    pub fn templates(&self) -> &MessageTemplates {
        &self.templates
    }

    /// Number of features that carry a threshold band.
    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        for (key, config) in &self.features {
            let ThresholdBand { good, ceiling } = config.threshold;
            if !ceiling.is_finite() || ceiling == 0.0 {
                return Err(CatalogError::InvalidCeiling {
                    feature: *key,
                    ceiling,
                });
            }
            if !good.is_finite() {
                return Err(CatalogError::InvalidThreshold {
                    feature: *key,
                    threshold: good,
                });
            }
        }
        Ok(())
    }

    pub fn ukrainian() -> Result<Self, CatalogError> {
        let templates = MessageTemplates {
            increase: "Збільшіть".to_string(),
            decrease: "Зменшіть".to_string(),
            cannot_improve: "Цей показник неможливо покращити найближчим часом.".to_string(),
            no_improvement_needed:
                "Ваші показники вже відповідають рекомендованим значенням. Так тримати!"
                    .to_string(),
        };

        let features = standard_table(&[
            (
                "Доступний залишок кредитного ліміту",
                "Більший вільний ліміт показує, що ви не залежите від позикових коштів.",
            ),
            (
                "Використання відновлюваного кредиту (%)",
                "Тримайте використання кредитних ліній нижче половини ліміту.",
            ),
            (
                "Частка рахунків без прострочень",
                "Сплачуйте всі кредити вчасно, щоб частка рахунків без прострочень зростала.",
            ),
            (
                "Кількість негативних записів",
                "Негативні записи залишаються в кредитній історії протягом кількох років.",
            ),
            (
                "Кількість стягнень",
                "Погасіть заборгованості, передані колекторам, і уникайте нових.",
            ),
            (
                "Вік найстарішої кредитної лінії (міс.)",
                "Довга кредитна історія формується лише з часом; не закривайте старі рахунки.",
            ),
            (
                "Кількість активних кредитних ліній",
                "Кілька активних кредитних ліній з гарною історією підвищують довіру кредитора.",
            ),
            (
                "Загальний кредитний ліміт",
                "Вищий загальний ліміт свідчить про довіру інших кредиторів.",
            ),
            (
                "Рахунки з використанням понад 75% ліміту",
                "Рахунки, використані майже повністю, сигналізують про фінансове напруження.",
            ),
            (
                "Кредити, прострочені понад 120 днів",
                "Тривалі прострочення суттєво знижують шанси на схвалення кредиту.",
            ),
            (
                "Місяців з моменту відкриття останньої кредитної лінії",
                "Не відкривайте нові кредитні лінії надто часто.",
            ),
            (
                "Вік найстарішого кредиту з розстрочкою (міс.)",
                "Тривала історія розстрочок формується лише з часом.",
            ),
            (
                "Кредити, отримані за останні 2 роки",
                "Велика кількість нових кредитів за короткий час насторожує кредиторів.",
            ),
            (
                "Ліміт кредитів з розстрочкою",
                "Успішно обслуговані кредити з розстрочкою покращують вашу історію.",
            ),
            (
                "Використання кредитних карток (%)",
                "Погашайте баланс кредитних карток, щоб знизити їх використання.",
            ),
            (
                "Щомісячні платежі за боргами",
                "Нижче боргове навантаження відносно доходу підвищує шанси на схвалення.",
            ),
            (
                "Середній баланс на рахунках",
                "Стабільний залишок коштів на рахунках свідчить про фінансову дисципліну.",
            ),
            (
                "Загальний дохід",
                "Людям з вищим підтвердженим доходом частіше схвалюють кредити.",
            ),
            (
                "Кредити, прострочені понад 30 днів",
                "Навіть короткі прострочення знижують ваш кредитний рейтинг.",
            ),
            (
                "Власне житло",
                "Наявність власного житла підвищує довіру кредиторів.",
            ),
            (
                "Оренда житла",
                "Позичальникам, які орендують житло, кредити схвалюють рідше.",
            ),
        ]);

        Self::new(templates, features, special_features())
    }

    pub fn english() -> Result<Self, CatalogError> {
        let templates = MessageTemplates {
            increase: "Increase".to_string(),
            decrease: "Decrease".to_string(),
            cannot_improve: "This indicator cannot be improved in the near term.".to_string(),
            no_improvement_needed:
                "Your indicators already meet the recommended values. Keep it up!".to_string(),
        };

        let features = standard_table(&[
            (
                "Open-to-buy on credit lines",
                "More unused credit shows you do not depend on borrowed money.",
            ),
            (
                "Revolving utilization (%)",
                "Keep revolving balances below half of their limits.",
            ),
            (
                "Share of accounts never delinquent",
                "Pay every account on time so the delinquency-free share grows.",
            ),
            (
                "Derogatory public records",
                "Derogatory records stay on the credit file for several years.",
            ),
            (
                "Collections",
                "Settle debts placed with collection agencies and avoid new ones.",
            ),
            (
                "Age of oldest revolving account (months)",
                "A long credit history only builds with time; keep old accounts open.",
            ),
            (
                "Active revolving accounts",
                "A few active accounts in good standing increase lender confidence.",
            ),
            (
                "Total credit limit",
                "A higher combined limit signals trust from other lenders.",
            ),
            (
                "Accounts above 75% of limit",
                "Nearly maxed-out accounts signal financial strain.",
            ),
            (
                "Credits overdue more than 120 days",
                "Long delinquencies sharply reduce approval chances.",
            ),
            (
                "Months since most recent revolving account",
                "Avoid opening new credit lines too often.",
            ),
            (
                "Age of oldest installment account (months)",
                "Installment history only builds with time.",
            ),
            (
                "Credits taken in the last 2 years",
                "Many new credits in a short period worry lenders.",
            ),
            (
                "Installment credit limit",
                "Installment loans repaid in good standing strengthen your history.",
            ),
            (
                "Card utilization (%)",
                "Pay down card balances to lower their utilization.",
            ),
            (
                "Monthly debt payments",
                "A lower debt burden relative to income improves approval chances.",
            ),
            (
                "Average account balance",
                "Steady balances on your accounts show financial discipline.",
            ),
            (
                "Total income",
                "Borrowers with higher verified income are approved more often.",
            ),
            (
                "Credits overdue more than 30 days",
                "Even short delinquencies lower your score.",
            ),
            (
                "Home ownership",
                "Owning your home increases lender confidence.",
            ),
            (
                "Renting",
                "Borrowers who rent their home are approved less often.",
            ),
        ]);

        Self::new(templates, features, special_features())
    }
}

/// Band, direction, and actionability per tracked feature, in the same order as the
/// localized text tables.
const STANDARD_BANDS: [(FeatureKey, f64, f64, bool, bool); 21] = [
    // (key, good, ceiling, is_negative, can_improve)
    (FeatureKey::BcOpenToBuy, 11394.25, 711140.0, false, true),
    (FeatureKey::RevolUtil, 49.91, 892.0, true, true),
    (FeatureKey::PctTlNvrDlq, 93.92, 100.0, false, true),
    (FeatureKey::DerogatoryRecords, 0.20, 86.0, true, false),
    (FeatureKey::Collections, 232.71, 9152545.0, true, true),
    (FeatureKey::MonthsSinceOldestRevolving, 181.48, 999.0, false, false),
    (FeatureKey::ActiveRevolvingTrades, 5.61, 72.0, false, true),
    (FeatureKey::TotalCreditLimit, 178242.73, 9999999.0, false, true),
    (FeatureKey::AccountsOver75PercentLimit, 42.30, 100.0, true, true),
    (FeatureKey::CreditsOverdue120Days, 0.48, 58.0, true, true),
    (FeatureKey::MonthsSinceRecentRevolving, 14.02, 547.0, false, true),
    (FeatureKey::MonthsSinceOldestInstallment, 125.69, 999.0, false, false),
    (FeatureKey::CreditsTakenLast2Years, 4.51, 64.0, true, true),
    (FeatureKey::InstallmentHighCreditLimit, 43732.01, 2118996.0, false, true),
    (FeatureKey::BcUtil, 57.46, 339.0, true, true),
    (FeatureKey::MonthlyDebtPayments, 18.33, 999.0, true, true),
    (FeatureKey::AverageCurrentBalance, 13547.77, 958084.0, false, true),
    (FeatureKey::TotalIncome, 77992.42, 110000000.0, false, true),
    (FeatureKey::CreditsOverdue30Days, 0.31, 58.0, true, true),
    (FeatureKey::HomeOwnershipOwn, 1.0, 1.0, false, true),
    (FeatureKey::HomeOwnershipRent, 0.0, 1.0, true, true),
];

fn standard_table(text: &[(&str, &str); 21]) -> BTreeMap<FeatureKey, FeatureConfig> {
    STANDARD_BANDS
        .iter()
        .zip(text.iter())
        .map(
            |(&(key, good, ceiling, is_negative, can_improve), &(name, explanation))| {
                let config = FeatureConfig {
                    threshold: ThresholdBand { good, ceiling },
                    display_name: name.to_string(),
                    explanation: explanation.to_string(),
                    status: FeatureStatus {
                        can_improve,
                        is_negative,
                    },
                };
                (key, config)
            },
        )
        .collect()
}

fn special_features() -> BTreeSet<FeatureKey> {
    [FeatureKey::HomeOwnershipOwn, FeatureKey::HomeOwnershipRent]
        .into_iter()
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("feature {feature} has invalid normalization ceiling {ceiling}")]
    InvalidCeiling { feature: FeatureKey, ceiling: f64 },
    #[error("feature {feature} has invalid good threshold {threshold}")]
    InvalidThreshold { feature: FeatureKey, threshold: f64 },
    #[error("unable to read feature catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed feature catalog: {0}")]
    Parse(#[from] serde_json::Error),
}
