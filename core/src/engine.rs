//! The scoring engine: one batch recompute over the current complaint snapshot.
//!
//! PIPELINE (fixed order):
//!   1. Read the complaint fact stream and external signals from the store
//!   2. Score every customer (raw components)
//!   3. Normalise across the population
//!   4. Replace the risk_profile table wholesale
//!   5. Record the scoring run
//!
//! RULES:
//!   - A recompute is a pure function of (snapshot, as_of): same input, same output.
//!   - Profiles are never merged with a previous run.

use crate::{
    complaint::ComplaintFact,
    config::RiskConfig,
    error::RiskResult,
    report::{self, AgentPerformance, ChannelPerformance, ParetoRow, TenureCohort},
    risk::{RiskProfile, RiskScorer, ScoreRange, SignalSource},
    store::{RiskStore, ScoringRun},
    summary::{self, PeriodSummary, ReportPeriod},
};
use chrono::NaiveDate;

pub struct RiskEngine {
    pub config: RiskConfig,
    pub store:  RiskStore,
    scorer:     RiskScorer,
}

impl RiskEngine {
    pub fn new(config: RiskConfig, store: RiskStore) -> Self {
        let scorer = RiskScorer::new(config.model.clone());
        Self { config, store, scorer }
    }

    /// Engine over an in-memory, migrated store with the built-in config.
    pub fn build_test() -> RiskResult<Self> {
        let store = RiskStore::in_memory()?;
        store.migrate()?;
        Ok(Self::new(RiskConfig::default(), store))
    }

    /// Score a snapshot without touching the store.
    pub fn score_snapshot(
        &self,
        facts: &[ComplaintFact],
        signals: &dyn SignalSource,
        as_of: NaiveDate,
    ) -> (Vec<RiskProfile>, Option<ScoreRange>) {
        self.scorer.score_population(facts, signals, as_of)
    }

    /// Full recompute: read, score, normalise, overwrite.
    pub fn recompute(&self, as_of: NaiveDate) -> RiskResult<ScoringRun> {
        let facts = self.store.complaint_facts()?;
        let signals = self.store.customer_signals()?;
        log::debug!(
            "recompute: {} facts, {} external signal rows",
            facts.len(),
            signals.len(),
        );

        let (profiles, range) = self.score_snapshot(&facts, &signals, as_of);
        self.store.replace_risk_profiles(&profiles)?;

        let run = ScoringRun {
            run_id:        format!("risk-{as_of}"),
            as_of,
            model_version: self.config.model.model_version.clone(),
            customers:     profiles.len() as i64,
            range,
        };
        self.store.record_scoring_run(&run)?;

        match range {
            Some(r) => log::info!(
                "recompute as_of={as_of}: {} customers scored (raw {:.4}..{:.4})",
                profiles.len(),
                r.min_raw,
                r.max_raw,
            ),
            None => log::info!("recompute as_of={as_of}: no complaints on or before as-of date"),
        }
        Ok(run)
    }

    pub fn profiles(&self) -> RiskResult<Vec<RiskProfile>> {
        self.store.risk_profiles()
    }

    /// Stored profiles as JSON lines, in customer order.
    pub fn export_json_lines(&self) -> RiskResult<Vec<String>> {
        self.profiles()?
            .iter()
            .map(|p| serde_json::to_string(p).map_err(Into::into))
            .collect()
    }

    // ── Reporting ──────────────────────────────────────────────────

    pub fn period_summary(&self, period: ReportPeriod, now: NaiveDate) -> RiskResult<PeriodSummary> {
        let facts = self.store.complaint_facts()?;
        Ok(summary::period_summary(&facts, &self.config, period, now))
    }

    /// Convenience for callers holding a raw selector string.
    pub fn period_summary_for(&self, selector: &str, now: NaiveDate) -> RiskResult<PeriodSummary> {
        self.period_summary(ReportPeriod::parse(selector), now)
    }

    pub fn channel_report(&self) -> RiskResult<Vec<ChannelPerformance>> {
        Ok(report::channel_performance(&self.store.complaint_facts()?))
    }

    pub fn agent_report(&self) -> RiskResult<Vec<AgentPerformance>> {
        Ok(report::agent_performance(&self.store.complaint_facts()?, &self.config))
    }

    pub fn pareto_report(&self) -> RiskResult<Vec<ParetoRow>> {
        Ok(report::product_pareto(&self.store.complaint_facts()?))
    }

    /// Cohort view over the profiles of the latest recompute.
    pub fn cohort_report(&self) -> RiskResult<Vec<TenureCohort>> {
        let profiles = self.profiles()?;
        Ok(report::tenure_cohorts(&profiles, self.config.model.high_risk_threshold))
    }
}
