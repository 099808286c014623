//! SQLite store: fact join, external signals, profile replacement and runs.

use chrono::NaiveDate;
use complaint_risk_core::{
    complaint::{AgentRecord, ComplaintRecord, CustomerRecord},
    engine::RiskEngine,
    risk::ExternalSignals,
    store::RiskStore,
    types::{ResolutionStatus, Urgency},
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn store() -> RiskStore {
    let _ = env_logger::builder().is_test(true).try_init();
    let store = RiskStore::in_memory().unwrap();
    store.migrate().unwrap();
    store
}

fn customer(id: &str, segment: &str, signup: NaiveDate) -> CustomerRecord {
    CustomerRecord {
        customer_id: id.into(),
        name:        format!("Customer {id}"),
        segment:     segment.into(),
        signup_date: signup,
    }
}

fn complaint(id: &str, customer_id: &str, filed: NaiveDate) -> ComplaintRecord {
    ComplaintRecord {
        complaint_id:      id.into(),
        customer_id:       customer_id.into(),
        agent_id:          None,
        complaint_date:    filed,
        resolution_date:   None,
        resolution_status: ResolutionStatus::Open,
        urgency:           Urgency::Medium,
        channel:           "Web".into(),
        product_area:      None,
        description:       "slow refund".into(),
        sentiment_score:   Some(-0.45),
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn migrate_is_idempotent() {
    let s = store();
    s.migrate().unwrap();
    assert_eq!(s.customer_count().unwrap(), 0);
    assert_eq!(s.complaint_count().unwrap(), 0);
    assert_eq!(s.risk_profile_count().unwrap(), 0);
}

/// Complaints whose customer is missing are excluded from the fact stream.
#[test]
fn orphan_complaints_are_excluded_from_facts() {
    let s = store();
    s.insert_customer(&customer("C1", "Premium", date(2023, 1, 1))).unwrap();
    s.insert_complaint(&complaint("k1", "C1", date(2024, 2, 1))).unwrap();
    s.insert_complaint(&complaint("k2", "GHOST", date(2024, 2, 2))).unwrap();

    assert_eq!(s.complaint_count().unwrap(), 2);
    let facts = s.complaint_facts().unwrap();
    assert_eq!(facts.len(), 1);
    assert_eq!(facts[0].complaint_id, "k1");
    assert_eq!(facts[0].segment, "Premium");
    assert_eq!(facts[0].signup_date, date(2023, 1, 1));
}

#[test]
fn facts_carry_agent_skillset_and_parsed_enums() {
    let s = store();
    s.insert_customer(&customer("C1", "Standard", date(2023, 5, 1))).unwrap();
    s.insert_agent(&AgentRecord {
        agent_id: "A001".into(),
        name:     "Agent One".into(),
        skillset: "technical".into(),
    })
    .unwrap();

    let mut c = complaint("k1", "C1", date(2024, 3, 1));
    c.agent_id = Some("A001".into());
    c.urgency = Urgency::High;
    c.resolution_status = ResolutionStatus::Closed;
    c.resolution_date = Some(date(2024, 3, 4));
    c.product_area = Some("Connectivity".into());
    s.insert_complaint(&c).unwrap();

    let fact = &s.complaint_facts().unwrap()[0];
    assert_eq!(fact.agent_id.as_deref(), Some("A001"));
    assert_eq!(fact.agent_skillset.as_deref(), Some("technical"));
    assert_eq!(fact.urgency, Urgency::High);
    assert_eq!(fact.resolution_status, ResolutionStatus::Closed);
    assert_eq!(fact.resolution_days(), Some(3));
    assert_eq!(fact.sentiment_score, Some(-0.45));
}

#[test]
fn facts_are_ordered_by_customer_then_date() {
    let s = store();
    s.insert_customer(&customer("B", "Standard", date(2023, 1, 1))).unwrap();
    s.insert_customer(&customer("A", "Standard", date(2023, 1, 1))).unwrap();
    s.insert_complaint(&complaint("b2", "B", date(2024, 1, 9))).unwrap();
    s.insert_complaint(&complaint("a1", "A", date(2024, 1, 5))).unwrap();
    s.insert_complaint(&complaint("b1", "B", date(2024, 1, 2))).unwrap();

    let ids: Vec<String> = s
        .complaint_facts()
        .unwrap()
        .into_iter()
        .map(|f| f.complaint_id)
        .collect();
    assert_eq!(ids, vec!["a1", "b1", "b2"]);
}

#[test]
fn duplicate_complaint_id_is_rejected() {
    let s = store();
    s.insert_customer(&customer("C1", "Standard", date(2023, 1, 1))).unwrap();
    s.insert_complaint(&complaint("k1", "C1", date(2024, 1, 1))).unwrap();
    assert!(s.insert_complaint(&complaint("k1", "C1", date(2024, 1, 2))).is_err());
}

#[test]
fn signals_upsert_and_read_back() {
    let s = store();
    s.upsert_signal("C1", &ExternalSignals { volume_risk: Some(0.4), severity_risk: None })
        .unwrap();
    s.upsert_signal("C1", &ExternalSignals { volume_risk: Some(0.6), severity_risk: Some(0.2) })
        .unwrap();
    s.upsert_signal("C2", &ExternalSignals::default()).unwrap();

    let signals = s.customer_signals().unwrap();
    assert_eq!(signals.len(), 2);
    assert_eq!(
        signals["C1"],
        ExternalSignals { volume_risk: Some(0.6), severity_risk: Some(0.2) }
    );
    assert_eq!(signals["C2"], ExternalSignals::default());
}

/// A second recompute fully replaces the first run's profiles.
#[test]
fn recompute_replaces_profiles_wholesale() {
    let engine = RiskEngine::build_test().unwrap();
    let s = &engine.store;
    s.insert_customer(&customer("C1", "Premium", date(2023, 1, 1))).unwrap();
    s.insert_customer(&customer("C2", "Standard", date(2024, 1, 20))).unwrap();
    s.insert_complaint(&complaint("k1", "C1", date(2024, 1, 10))).unwrap();
    s.insert_complaint(&complaint("k2", "C2", date(2024, 2, 10))).unwrap();

    let first = engine.recompute(date(2024, 3, 1)).unwrap();
    assert_eq!(first.customers, 2);
    assert_eq!(s.risk_profile_count().unwrap(), 2);

    // Earlier as-of date: C2's complaint is now in the future.
    let second = engine.recompute(date(2024, 1, 31)).unwrap();
    assert_eq!(second.customers, 1);
    let profiles = engine.profiles().unwrap();
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0].customer_id, "C1");
}

#[test]
fn profiles_round_trip_through_sqlite() {
    let engine = RiskEngine::build_test().unwrap();
    let s = &engine.store;
    s.insert_customer(&customer("C1", "Premium", date(2023, 9, 1))).unwrap();
    s.insert_customer(&customer("C2", "Standard", date(2024, 2, 15))).unwrap();
    s.insert_complaint(&complaint("k1", "C1", date(2024, 1, 10))).unwrap();
    s.insert_complaint(&complaint("k2", "C1", date(2024, 2, 20))).unwrap();
    s.insert_complaint(&complaint("k3", "C2", date(2024, 2, 28))).unwrap();

    let as_of = date(2024, 3, 1);
    let facts = s.complaint_facts().unwrap();
    let signals = s.customer_signals().unwrap();
    let (expected, _) = engine.score_snapshot(&facts, &signals, as_of);

    engine.recompute(as_of).unwrap();
    assert_eq!(engine.profiles().unwrap(), expected);
}

#[test]
fn scoring_run_is_recorded_and_upserted() {
    let engine = RiskEngine::build_test().unwrap();
    assert!(engine.store.latest_scoring_run().unwrap().is_none());

    engine.store.insert_customer(&customer("C1", "Standard", date(2023, 1, 1))).unwrap();
    engine.store.insert_customer(&customer("C2", "Premium", date(2023, 1, 1))).unwrap();
    engine.store.insert_complaint(&complaint("k1", "C1", date(2024, 2, 1))).unwrap();
    engine.store.insert_complaint(&complaint("k2", "C2", date(2024, 2, 1))).unwrap();

    let run = engine.recompute(date(2024, 3, 1)).unwrap();
    assert_eq!(run.run_id, "risk-2024-03-01");
    assert_eq!(run.customers, 2);
    let range = run.range.unwrap();
    assert!(range.max_raw > range.min_raw);

    // Re-running the same as-of date keeps a single run row.
    engine.recompute(date(2024, 3, 1)).unwrap();
    let earlier = engine.recompute(date(2024, 2, 15)).unwrap();
    assert_eq!(earlier.run_id, "risk-2024-02-15");

    let latest = engine.store.latest_scoring_run().unwrap().unwrap();
    assert_eq!(latest, run);
}

#[test]
fn recompute_over_empty_store_records_empty_run() {
    let engine = RiskEngine::build_test().unwrap();
    let run = engine.recompute(date(2024, 3, 1)).unwrap();
    assert_eq!(run.customers, 0);
    assert!(run.range.is_none());
    assert!(engine.profiles().unwrap().is_empty());
}
