//! Customer risk scoring: multi-factor churn-risk profile per customer.
//!
//! A scoring pass:
//!   1. Groups the complaint facts by customer (facts after the as-of date are ignored)
//!   2. Computes the six weighted components per customer
//!   3. Sums them into a raw score
//!   4. Min-max normalises the raw scores across the whole population of the pass
//!   5. Buckets each customer by tenure
//!
//! Normalisation is relative to the pass, so profiles from different passes
//! are not comparable and must be replaced wholesale.

use crate::{
    complaint::ComplaintFact,
    config::{RiskModelConfig, RiskWeights},
    types::CustomerId,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

// ── Public types ─────────────────────────────────────────────────────────────

/// Pre-aggregated signals supplied from outside the engine.
/// A missing value is derived from the complaint history instead.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ExternalSignals {
    pub volume_risk:   Option<f64>,
    pub severity_risk: Option<f64>,
}

/// Source of externally supplied signals, keyed by customer.
pub trait SignalSource {
    fn signals_for(&self, customer_id: &str) -> Option<ExternalSignals>;
}

impl SignalSource for HashMap<CustomerId, ExternalSignals> {
    fn signals_for(&self, customer_id: &str) -> Option<ExternalSignals> {
        self.get(customer_id).copied()
    }
}

impl SignalSource for BTreeMap<CustomerId, ExternalSignals> {
    fn signals_for(&self, customer_id: &str) -> Option<ExternalSignals> {
        self.get(customer_id).copied()
    }
}

/// No external signals: every volume/severity value is derived.
pub struct DerivedOnly;

impl SignalSource for DerivedOnly {
    fn signals_for(&self, _customer_id: &str) -> Option<ExternalSignals> {
        None
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RiskComponents {
    pub volume_risk:     f64,
    pub severity_risk:   f64,
    pub recency_factor:  f64,
    pub is_new_customer: u8,
    pub customer_value:  f64,
    /// Signed contribution: negated mean sentiment, 0 when unknown.
    pub sentiment:       f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TenureBucket {
    #[serde(rename = "3 Months")]
    UpTo3Months,
    #[serde(rename = "3-6 Months")]
    From3To6Months,
    #[serde(rename = "6-12 Months")]
    From6To12Months,
    #[serde(rename = "1-2 Years")]
    From1To2Years,
    #[serde(rename = "2+ Years")]
    Over2Years,
}

impl TenureBucket {
    pub const ALL: [TenureBucket; 5] = [
        TenureBucket::UpTo3Months,
        TenureBucket::From3To6Months,
        TenureBucket::From6To12Months,
        TenureBucket::From1To2Years,
        TenureBucket::Over2Years,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::UpTo3Months     => "3 Months",
            Self::From3To6Months  => "3-6 Months",
            Self::From6To12Months => "6-12 Months",
            Self::From1To2Years   => "1-2 Years",
            Self::Over2Years      => "2+ Years",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskProfile {
    pub customer_id:           CustomerId,
    pub segment:               String,
    pub complaint_count:       u32,
    pub last_complaint_date:   NaiveDate,
    pub components:            RiskComponents,
    pub avg_sentiment:         Option<f64>,
    /// Mean days between complaints. None for a single complaint.
    pub frequency:             Option<f64>,
    pub raw_risk_score:        f64,
    pub normalized_risk_score: f64,
    pub tenure_days:           i64,
    pub tenure_bucket:         TenureBucket,
}

impl RiskProfile {
    /// Normalised score rounded for display.
    pub fn display_score(&self) -> f64 {
        round2(self.normalized_risk_score)
    }
}

/// Population statistics of one scoring pass.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScoreRange {
    pub min_raw: f64,
    pub max_raw: f64,
}

impl ScoreRange {
    pub fn is_degenerate(&self) -> bool {
        self.max_raw - self.min_raw <= f64::EPSILON
    }
}

// ── Component functions ──────────────────────────────────────────────────────

/// Exponential decay on the age of the latest complaint. 1.0 on the day itself.
pub fn recency_factor(days_since_last: i64, decay_days: f64) -> f64 {
    (-(days_since_last.max(0) as f64) / decay_days).exp()
}

/// New when signed up no more than `window_days` before `as_of` (inclusive).
/// A signup after `as_of` also counts as new.
pub fn is_new_customer(signup_date: NaiveDate, as_of: NaiveDate, window_days: i64) -> bool {
    (as_of - signup_date).num_days() <= window_days
}

pub fn customer_value(segment: &str, model: &RiskModelConfig) -> f64 {
    if segment == model.premium_segment {
        model.premium_value
    } else {
        model.standard_value
    }
}

/// Mean days between first and last complaint. Undefined for fewer than two.
pub fn frequency(first: NaiveDate, last: NaiveDate, count: usize) -> Option<f64> {
    if count < 2 {
        return None;
    }
    Some((last - first).num_days() as f64 / count as f64)
}

pub fn raw_risk_score(c: &RiskComponents, w: &RiskWeights) -> f64 {
    w.volume * c.volume_risk
        + w.severity * c.severity_risk
        + w.recency * c.recency_factor
        + w.new_customer * f64::from(c.is_new_customer)
        + w.customer_value * c.customer_value
        + w.sentiment * c.sentiment
}

/// First matching bucket wins, top-down. 180 and 365 close the earlier bucket.
pub fn tenure_bucket(tenure_days: i64) -> TenureBucket {
    match tenure_days {
        d if d < 90   => TenureBucket::UpTo3Months,
        d if d <= 180 => TenureBucket::From3To6Months,
        d if d <= 365 => TenureBucket::From6To12Months,
        d if d <= 730 => TenureBucket::From1To2Years,
        _             => TenureBucket::Over2Years,
    }
}

/// Min-max normalise raw scores in place. All scores become 0 when the
/// population has a single distinct raw score.
pub fn normalize(profiles: &mut [RiskProfile]) -> Option<ScoreRange> {
    let first = profiles.first()?.raw_risk_score;
    let range = profiles.iter().fold(
        ScoreRange { min_raw: first, max_raw: first },
        |acc, p| ScoreRange {
            min_raw: acc.min_raw.min(p.raw_risk_score),
            max_raw: acc.max_raw.max(p.raw_risk_score),
        },
    );

    let span = range.max_raw - range.min_raw;
    for p in profiles.iter_mut() {
        p.normalized_risk_score = if range.is_degenerate() {
            0.0
        } else {
            ((p.raw_risk_score - range.min_raw) / span).clamp(0.0, 1.0)
        };
    }
    Some(range)
}

pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn unit_or_none(x: Option<f64>) -> Option<f64> {
    x.filter(|v| v.is_finite()).map(|v| v.clamp(0.0, 1.0))
}

// ── Scorer ───────────────────────────────────────────────────────────────────

pub struct RiskScorer {
    model: RiskModelConfig,
}

impl RiskScorer {
    pub fn new(model: RiskModelConfig) -> Self {
        Self { model }
    }

    /// Score every customer with at least one complaint on or before `as_of`.
    /// Output is ordered by customer id.
    pub fn score_population(
        &self,
        facts: &[ComplaintFact],
        signals: &dyn SignalSource,
        as_of: NaiveDate,
    ) -> (Vec<RiskProfile>, Option<ScoreRange>) {
        let mut by_customer: BTreeMap<&str, Vec<&ComplaintFact>> = BTreeMap::new();
        let mut future = 0usize;
        for fact in facts {
            if fact.complaint_date > as_of {
                future += 1;
                continue;
            }
            by_customer.entry(fact.customer_id.as_str()).or_default().push(fact);
        }
        if future > 0 {
            log::debug!("risk: ignored {future} complaints dated after {as_of}");
        }

        // Pass 1: raw scores.
        let mut profiles: Vec<RiskProfile> = by_customer
            .into_iter()
            .filter_map(|(customer_id, history)| {
                self.score_customer(customer_id, &history, signals.signals_for(customer_id), as_of)
            })
            .collect();

        // Pass 2: population normalisation.
        let range = normalize(&mut profiles);
        if let Some(r) = range {
            if r.is_degenerate() && profiles.len() > 1 {
                log::warn!(
                    "risk: all {} customers share raw score {:.4}; normalised scores set to 0",
                    profiles.len(),
                    r.min_raw,
                );
            }
        }
        (profiles, range)
    }

    /// Raw profile for one customer (normalised score left at 0).
    pub fn score_customer(
        &self,
        customer_id: &str,
        history: &[&ComplaintFact],
        external: Option<ExternalSignals>,
        as_of: NaiveDate,
    ) -> Option<RiskProfile> {
        let anchor = history.first()?;
        let model = &self.model;
        let count = history.len();

        let first = history.iter().map(|f| f.complaint_date).min()?;
        let last = history.iter().map(|f| f.complaint_date).max()?;

        let external = external.unwrap_or_default();

        // Volume: complaints filed inside the trailing window.
        let window_start = as_of - chrono::Duration::days(model.volume_window_days);
        let volume_risk = unit_or_none(external.volume_risk).unwrap_or_else(|| {
            let recent = history.iter().filter(|f| f.filed_between(window_start, as_of)).count();
            (recent as f64 / f64::from(model.volume_threshold)).min(1.0)
        });

        // Severity: share of high-urgency and unresolved complaints.
        let severity_risk = unit_or_none(external.severity_risk).unwrap_or_else(|| {
            let high = history.iter().filter(|f| f.urgency == crate::types::Urgency::High).count();
            let unresolved = history.iter().filter(|f| f.resolution_status.is_unresolved()).count();
            let n = count as f64;
            (model.severity_blend.high_urgency_weight * (high as f64 / n)
                + model.severity_blend.unresolved_weight * (unresolved as f64 / n))
                .clamp(0.0, 1.0)
        });

        let days_since_last = (as_of - last).num_days().max(0);
        let recency = recency_factor(days_since_last, model.recency_decay_days);

        let is_new = is_new_customer(anchor.signup_date, as_of, model.new_customer_window_days);
        let value = customer_value(&anchor.segment, model);

        let scored: Vec<f64> = history
            .iter()
            .filter_map(|f| f.sentiment_score)
            .filter(|s| s.is_finite())
            .collect();
        let avg_sentiment = if scored.is_empty() {
            None
        } else {
            Some(scored.iter().sum::<f64>() / scored.len() as f64)
        };

        let components = RiskComponents {
            volume_risk,
            severity_risk,
            recency_factor: recency,
            is_new_customer: u8::from(is_new),
            customer_value: value,
            sentiment: avg_sentiment.map(|s| -s).unwrap_or(0.0),
        };
        let raw = raw_risk_score(&components, &model.weights);

        let tenure_days = (as_of - anchor.signup_date).num_days();

        Some(RiskProfile {
            customer_id: customer_id.to_string(),
            segment: anchor.segment.clone(),
            complaint_count: count as u32,
            last_complaint_date: last,
            components,
            avg_sentiment,
            frequency: frequency(first, last, count),
            raw_risk_score: raw,
            normalized_risk_score: 0.0,
            tenure_days,
            tenure_bucket: tenure_bucket(tenure_days),
        })
    }
}
