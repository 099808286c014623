//! Dashboard reports: channel, agent, product Pareto and tenure cohort.
//!
//! Plain group-and-aggregate over the complaint facts (and, for the cohort
//! report, over the profiles of one scoring pass). Percentages are rounded
//! to two decimals.

use crate::{
    complaint::ComplaintFact,
    config::RiskConfig,
    risk::{round2, RiskProfile, TenureBucket},
    summary::UNASSIGNED_PRODUCT_AREA,
    types::{AgentId, ResolutionStatus},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cumulative share that closes the "vital few" product areas.
pub const PARETO_CUTOFF_PCT: f64 = 80.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelPerformance {
    pub channel:              String,
    pub complaints:           u32,
    pub share_pct:            f64,
    pub closed:               u32,
    pub resolution_rate_pct:  f64,
    pub mean_resolution_days: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentPerformance {
    pub agent_id:             AgentId,
    pub product_area:         String,
    pub handled:              u32,
    pub resolved:             u32,
    pub mean_resolution_days: Option<f64>,
    /// Dense rank by mean resolution days, 1 = fastest. None when nothing resolved.
    pub rank:                 Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParetoRow {
    pub product_area:       String,
    pub complaints:         u32,
    pub share_pct:          f64,
    pub cumulative_pct:     f64,
    pub vital_few:          bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TenureCohort {
    pub tenure_bucket:   TenureBucket,
    pub customers:       u32,
    pub mean_raw_score:  f64,
    pub mean_normalized: f64,
    pub high_risk:       u32,
}

fn pct(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round2(f64::from(part) / f64::from(whole) * 100.0)
}

#[derive(Default)]
struct ResolutionTally {
    handled:   u32,
    closed:    u32,
    resolved:  u32,
    days:      i64,
}

impl ResolutionTally {
    fn add(&mut self, fact: &ComplaintFact) {
        self.handled += 1;
        if fact.resolution_status == ResolutionStatus::Closed {
            self.closed += 1;
        }
        if let Some(d) = fact.resolution_days() {
            self.resolved += 1;
            self.days += d;
        }
    }

    fn exact_mean_days(&self) -> Option<f64> {
        (self.resolved > 0).then(|| self.days as f64 / f64::from(self.resolved))
    }

    fn mean_days(&self) -> Option<f64> {
        self.exact_mean_days().map(round2)
    }
}

pub fn channel_performance(facts: &[ComplaintFact]) -> Vec<ChannelPerformance> {
    let mut tallies: BTreeMap<&str, ResolutionTally> = BTreeMap::new();
    for fact in facts {
        tallies.entry(fact.channel.as_str()).or_default().add(fact);
    }
    let total = facts.len() as u32;

    let mut rows: Vec<ChannelPerformance> = tallies
        .into_iter()
        .map(|(channel, t)| ChannelPerformance {
            channel: channel.to_string(),
            complaints: t.handled,
            share_pct: pct(t.handled, total),
            closed: t.closed,
            resolution_rate_pct: pct(t.closed, t.handled),
            mean_resolution_days: t.mean_days(),
        })
        .collect();
    rows.sort_by(|a, b| b.complaints.cmp(&a.complaints));
    rows
}

pub fn agent_performance(facts: &[ComplaintFact], config: &RiskConfig) -> Vec<AgentPerformance> {
    let mut tallies: BTreeMap<&str, (Option<&str>, ResolutionTally)> = BTreeMap::new();
    for fact in facts {
        let Some(agent_id) = fact.agent_id.as_deref() else { continue };
        tallies
            .entry(agent_id)
            .or_insert_with(|| (fact.agent_skillset.as_deref(), ResolutionTally::default()))
            .1
            .add(fact);
    }

    // Rank on the exact mean; only the reported field is rounded.
    let mut ranked: Vec<(AgentPerformance, Option<f64>)> = tallies
        .into_iter()
        .map(|(agent_id, (skillset, t))| {
            let row = AgentPerformance {
                agent_id: agent_id.to_string(),
                product_area: config.product_area_for_skillset(skillset.unwrap_or_default()).to_string(),
                handled: t.handled,
                resolved: t.resolved,
                mean_resolution_days: t.mean_days(),
                rank: None,
            };
            (row, t.exact_mean_days())
        })
        .collect();

    // Ranked agents first (fastest first), then the ones with nothing resolved.
    ranked.sort_by(|(_, a), (_, b)| match (a, b) {
        (Some(x), Some(y)) => x.partial_cmp(y).unwrap_or(std::cmp::Ordering::Equal),
        (Some(_), None)    => std::cmp::Ordering::Less,
        (None, Some(_))    => std::cmp::Ordering::Greater,
        (None, None)       => std::cmp::Ordering::Equal,
    });

    let mut rank = 0u32;
    let mut previous: Option<f64> = None;
    for (row, exact) in ranked.iter_mut() {
        let Some(mean) = *exact else { break };
        if previous != Some(mean) {
            rank += 1;
            previous = Some(mean);
        }
        row.rank = Some(rank);
    }
    ranked.into_iter().map(|(row, _)| row).collect()
}

pub fn product_pareto(facts: &[ComplaintFact]) -> Vec<ParetoRow> {
    let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
    for fact in facts {
        let area = fact.product_area.as_deref().unwrap_or(UNASSIGNED_PRODUCT_AREA);
        *counts.entry(area).or_default() += 1;
    }
    let total: u32 = counts.values().sum();

    let mut sorted: Vec<(&str, u32)> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1));

    let mut running = 0u32;
    sorted
        .into_iter()
        .map(|(area, count)| {
            // Decided on exact counts; the area that crosses the cutoff is
            // still one of the vital few.
            let vital_few = f64::from(running) * 100.0 < PARETO_CUTOFF_PCT * f64::from(total);
            running += count;
            ParetoRow {
                product_area: area.to_string(),
                complaints: count,
                share_pct: pct(count, total),
                cumulative_pct: pct(running, total),
                vital_few,
            }
        })
        .collect()
}

pub fn tenure_cohorts(profiles: &[RiskProfile], high_risk_threshold: f64) -> Vec<TenureCohort> {
    TenureBucket::ALL
        .iter()
        .filter_map(|&bucket| {
            let members: Vec<&RiskProfile> =
                profiles.iter().filter(|p| p.tenure_bucket == bucket).collect();
            if members.is_empty() {
                return None;
            }
            let n = members.len() as f64;
            Some(TenureCohort {
                tenure_bucket: bucket,
                customers: members.len() as u32,
                mean_raw_score: members.iter().map(|p| p.raw_risk_score).sum::<f64>() / n,
                mean_normalized: members.iter().map(|p| p.normalized_risk_score).sum::<f64>() / n,
                high_risk: members
                    .iter()
                    .filter(|p| p.normalized_risk_score >= high_risk_threshold)
                    .count() as u32,
            })
        })
        .collect()
}
