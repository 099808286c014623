use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ── Risk model ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskModelConfig {
    pub model_version:            String,
    pub weights:                  RiskWeights,
    /// e-folding time of the recency decay, in days.
    pub recency_decay_days:       f64,
    pub new_customer_window_days: i64,
    pub volume_window_days:       i64,
    /// Complaints in the volume window at which volume risk saturates at 1.0.
    pub volume_threshold:         u32,
    pub severity_blend:           SeverityBlend,
    pub premium_segment:          String,
    pub premium_value:            f64,
    pub standard_value:           f64,
    /// Normalised score at or above which a customer is reported as high risk.
    pub high_risk_threshold:      f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RiskWeights {
    pub volume:         f64,
    pub severity:       f64,
    pub recency:        f64,
    pub new_customer:   f64,
    pub customer_value: f64,
    pub sentiment:      f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            volume:         0.30,
            severity:       0.30,
            recency:        0.20,
            new_customer:   0.10,
            customer_value: 0.10,
            sentiment:      0.10,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SeverityBlend {
    pub high_urgency_weight: f64,
    pub unresolved_weight:   f64,
}

impl Default for RiskModelConfig {
    fn default() -> Self {
        Self {
            model_version:            "1.0".into(),
            weights:                  RiskWeights::default(),
            recency_decay_days:       30.0,
            new_customer_window_days: 30,
            volume_window_days:       30,
            volume_threshold:         3,
            severity_blend:           SeverityBlend {
                high_urgency_weight: 0.5,
                unresolved_weight:   0.5,
            },
            premium_segment:          "Premium".into(),
            premium_value:            2.0,
            standard_value:           1.0,
            high_risk_threshold:      0.7,
        }
    }
}

// ── Static lookups ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SentimentKeyword {
    pub keyword:   String,
    pub sentiment: f64,
    pub theme:     String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkillsetMapping {
    pub skillset:     String,
    pub product_area: String,
}

#[derive(Debug, Clone, Deserialize)]
struct SentimentKeywordsFile {
    keywords: Vec<SentimentKeyword>,
}

#[derive(Debug, Clone, Deserialize)]
struct SkillsetProductsFile {
    mappings: Vec<SkillsetMapping>,
}

pub const UNMAPPED_PRODUCT_AREA: &str = "General";

// ── Top-level config ───────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RiskConfig {
    pub model:              RiskModelConfig,
    pub sentiment_keywords: Vec<SentimentKeyword>,
    pub skillset_products:  HashMap<String, String>,
}

impl RiskConfig {
    /// Load from the data/ directory.
    /// Without one, use RiskConfig::default().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let model_path = format!("{data_dir}/risk/risk_model.json");
        let model_content = std::fs::read_to_string(&model_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {model_path}: {e}"))?;
        let model: RiskModelConfig = serde_json::from_str(&model_content)?;

        let keyword_path = format!("{data_dir}/lookups/sentiment_keywords.json");
        let keyword_content = std::fs::read_to_string(&keyword_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {keyword_path}: {e}"))?;
        let keyword_file: SentimentKeywordsFile = serde_json::from_str(&keyword_content)?;

        let skill_path = format!("{data_dir}/lookups/skillset_products.json");
        let skill_content = std::fs::read_to_string(&skill_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {skill_path}: {e}"))?;
        let skill_file: SkillsetProductsFile = serde_json::from_str(&skill_content)?;

        let config = Self {
            model,
            sentiment_keywords: keyword_file.keywords,
            skillset_products: skill_file
                .mappings
                .into_iter()
                .map(|m| (m.skillset, m.product_area))
                .collect(),
        };
        config.validate()?;
        log::debug!(
            "Loaded risk model v{} ({} keywords, {} skillsets)",
            config.model.model_version,
            config.sentiment_keywords.len(),
            config.skillset_products.len(),
        );
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.model.recency_decay_days <= 0.0 {
            anyhow::bail!("recency_decay_days must be > 0");
        }
        if self.model.volume_threshold == 0 {
            anyhow::bail!("volume_threshold must be > 0");
        }
        for kw in &self.sentiment_keywords {
            if !(-1.0..=1.0).contains(&kw.sentiment) {
                anyhow::bail!("keyword '{}' sentiment {} outside [-1, 1]", kw.keyword, kw.sentiment);
            }
        }
        Ok(())
    }

    /// Product area served by an agent skillset.
    pub fn product_area_for_skillset(&self, skillset: &str) -> &str {
        self.skillset_products
            .get(skillset)
            .map(String::as_str)
            .unwrap_or(UNMAPPED_PRODUCT_AREA)
    }
}

impl Default for RiskConfig {
    fn default() -> Self {
        let kw = |keyword: &str, sentiment: f64, theme: &str| SentimentKeyword {
            keyword: keyword.into(),
            sentiment,
            theme: theme.into(),
        };
        let sentiment_keywords = vec![
            kw("refund",       -0.4, "Billing"),
            kw("overcharged",  -0.8, "Billing"),
            kw("charged twice",-0.9, "Billing"),
            kw("invoice",      -0.2, "Billing"),
            kw("slow",         -0.5, "Performance"),
            kw("crash",        -0.9, "Performance"),
            kw("outage",       -0.9, "Performance"),
            kw("rude",         -0.8, "Service"),
            kw("waiting",      -0.5, "Service"),
            kw("no response",  -0.7, "Service"),
            kw("late",         -0.6, "Delivery"),
            kw("damaged",      -0.8, "Delivery"),
            kw("cancel",       -0.7, "Retention"),
            kw("switch",       -0.6, "Retention"),
            kw("thank",         0.6, "Praise"),
            kw("helpful",       0.7, "Praise"),
            kw("resolved",      0.5, "Praise"),
        ];

        let skillset_products = [
            ("billing",   "Billing"),
            ("technical", "Connectivity"),
            ("hardware",  "Devices"),
            ("logistics", "Delivery"),
            ("retention", "Accounts"),
        ]
        .into_iter()
        .map(|(s, p)| (s.to_string(), p.to_string()))
        .collect();

        Self {
            model: RiskModelConfig::default(),
            sentiment_keywords,
            skillset_products,
        }
    }
}
