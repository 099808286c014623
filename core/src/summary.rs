//! Period summary: the WEEKLY / MONTHLY operational snapshot.
//!
//! Four independent result sets over the complaints filed in the lookback
//! window ending at `now` (inclusive on both ends):
//!   1. Top complaint themes by frequency
//!   2. Complaint counts per urgency level
//!   3. Complaint counts per product area
//!   4. Fastest agents by mean resolution time

use crate::{
    complaint::ComplaintFact,
    config::RiskConfig,
    sentiment,
    types::{AgentId, Urgency},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const TOP_N: usize = 5;
pub const UNASSIGNED_PRODUCT_AREA: &str = "Unassigned";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportPeriod {
    Weekly,
    Monthly,
}

impl ReportPeriod {
    /// Parse a period selector. Anything other than WEEKLY or MONTHLY
    /// falls back to WEEKLY rather than failing.
    pub fn parse(selector: &str) -> Self {
        match selector.trim().to_ascii_uppercase().as_str() {
            "MONTHLY" => Self::Monthly,
            "WEEKLY"  => Self::Weekly,
            other => {
                log::warn!("Unknown report period '{other}', using WEEKLY");
                Self::Weekly
            }
        }
    }

    pub fn lookback_days(&self) -> i64 {
        match self {
            Self::Weekly  => 7,
            Self::Monthly => 30,
        }
    }

    /// First day of the window ending at `now`.
    pub fn window_start(&self, now: NaiveDate) -> NaiveDate {
        now - chrono::Duration::days(self.lookback_days())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThemeCount {
    pub theme: String,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UrgencyCount {
    pub urgency: Urgency,
    pub count:   u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductAreaCount {
    pub product_area: String,
    pub count:        u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentResolution {
    pub agent_id:             AgentId,
    pub product_area:         String,
    pub resolved:             u32,
    pub mean_resolution_days: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PeriodSummary {
    pub period:       ReportPeriod,
    pub window_start: NaiveDate,
    pub window_end:   NaiveDate,
    pub complaints:   u32,
    pub top_themes:   Vec<ThemeCount>,
    pub by_urgency:   Vec<UrgencyCount>,
    pub by_product:   Vec<ProductAreaCount>,
    pub top_agents:   Vec<AgentResolution>,
}

pub fn period_summary(
    facts: &[ComplaintFact],
    config: &RiskConfig,
    period: ReportPeriod,
    now: NaiveDate,
) -> PeriodSummary {
    let start = period.window_start(now);
    let in_window: Vec<&ComplaintFact> =
        facts.iter().filter(|f| f.filed_between(start, now)).collect();

    log::debug!(
        "summary: {} complaints in {:?} window {start}..={now}",
        in_window.len(),
        period,
    );

    PeriodSummary {
        period,
        window_start: start,
        window_end: now,
        complaints: in_window.len() as u32,
        top_themes: top_themes(&in_window, config),
        by_urgency: urgency_counts(&in_window),
        by_product: product_area_counts(&in_window),
        top_agents: top_agents(&in_window, config),
    }
}

fn top_themes(facts: &[&ComplaintFact], config: &RiskConfig) -> Vec<ThemeCount> {
    let mut counts: BTreeMap<String, u32> = BTreeMap::new();
    for fact in facts {
        for theme in sentiment::themes(&config.sentiment_keywords, &fact.description) {
            *counts.entry(theme).or_default() += 1;
        }
    }
    let mut themes: Vec<ThemeCount> = counts
        .into_iter()
        .map(|(theme, count)| ThemeCount { theme, count })
        .collect();
    // BTreeMap order + stable sort = ties by name.
    themes.sort_by(|a, b| b.count.cmp(&a.count));
    themes.truncate(TOP_N);
    themes
}

fn urgency_counts(facts: &[&ComplaintFact]) -> Vec<UrgencyCount> {
    Urgency::ALL
        .iter()
        .map(|&urgency| UrgencyCount {
            urgency,
            count: facts.iter().filter(|f| f.urgency == urgency).count() as u32,
        })
        .collect()
}

fn product_area_counts(facts: &[&ComplaintFact]) -> Vec<ProductAreaCount> {
    let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
    for fact in facts {
        let area = fact.product_area.as_deref().unwrap_or(UNASSIGNED_PRODUCT_AREA);
        *counts.entry(area).or_default() += 1;
    }
    let mut areas: Vec<ProductAreaCount> = counts
        .into_iter()
        .map(|(area, count)| ProductAreaCount { product_area: area.to_string(), count })
        .collect();
    areas.sort_by(|a, b| b.count.cmp(&a.count));
    areas
}

fn top_agents(facts: &[&ComplaintFact], config: &RiskConfig) -> Vec<AgentResolution> {
    // agent_id -> (skillset, total days, resolved count)
    let mut totals: BTreeMap<&str, (Option<&str>, i64, u32)> = BTreeMap::new();
    for fact in facts {
        let (Some(agent_id), Some(days)) = (fact.agent_id.as_deref(), fact.resolution_days()) else {
            continue;
        };
        let entry = totals.entry(agent_id).or_insert((fact.agent_skillset.as_deref(), 0, 0));
        entry.1 += days;
        entry.2 += 1;
    }

    let mut agents: Vec<AgentResolution> = totals
        .into_iter()
        .map(|(agent_id, (skillset, days, resolved))| AgentResolution {
            agent_id: agent_id.to_string(),
            product_area: config.product_area_for_skillset(skillset.unwrap_or_default()).to_string(),
            resolved,
            mean_resolution_days: days as f64 / f64::from(resolved),
        })
        .collect();
    agents.sort_by(|a, b| {
        a.mean_resolution_days
            .partial_cmp(&b.mean_resolution_days)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    agents.truncate(TOP_N);
    agents
}
