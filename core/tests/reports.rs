//! Dashboard reports: channel, agent ranking, product Pareto, tenure cohorts.

use chrono::{Duration, NaiveDate};
use complaint_risk_core::{
    complaint::ComplaintFact,
    config::RiskConfig,
    report::{agent_performance, channel_performance, product_pareto, tenure_cohorts},
    risk::{DerivedOnly, RiskScorer, TenureBucket},
    types::{ResolutionStatus, Urgency},
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 31).unwrap()
}

fn fact(id: &str, channel: &str) -> ComplaintFact {
    ComplaintFact {
        complaint_id:      id.into(),
        customer_id:       format!("cust-{id}"),
        complaint_date:    as_of() - Duration::days(20),
        resolution_date:   None,
        resolution_status: ResolutionStatus::Open,
        urgency:           Urgency::Low,
        sentiment_score:   None,
        segment:           "Standard".into(),
        signup_date:       as_of() - Duration::days(400),
        channel:           channel.into(),
        product_area:      None,
        agent_id:          None,
        agent_skillset:    None,
        description:       String::new(),
    }
}

fn closed(mut f: ComplaintFact, days: i64) -> ComplaintFact {
    f.resolution_status = ResolutionStatus::Closed;
    f.resolution_date = Some(f.complaint_date + Duration::days(days));
    f
}

fn handled_by(mut f: ComplaintFact, agent: &str, skillset: &str) -> ComplaintFact {
    f.agent_id = Some(agent.into());
    f.agent_skillset = Some(skillset.into());
    f
}

fn in_area(mut f: ComplaintFact, area: Option<&str>) -> ComplaintFact {
    f.product_area = area.map(str::to_string);
    f
}

// ── Channel ──────────────────────────────────────────────────────────────────

#[test]
fn channel_share_and_resolution_rate() {
    let facts = vec![
        closed(fact("e1", "Email"), 2),
        closed(fact("e2", "Email"), 4),
        fact("e3", "Email"),
        fact("p1", "Phone"),
    ];
    let rows = channel_performance(&facts);
    assert_eq!(rows.len(), 2);

    let email = &rows[0];
    assert_eq!(email.channel, "Email");
    assert_eq!(email.complaints, 3);
    assert_eq!(email.share_pct, 75.0);
    assert_eq!(email.closed, 2);
    assert_eq!(email.resolution_rate_pct, 66.67);
    assert_eq!(email.mean_resolution_days, Some(3.0));

    let phone = &rows[1];
    assert_eq!(phone.share_pct, 25.0);
    assert_eq!(phone.resolution_rate_pct, 0.0);
    assert_eq!(phone.mean_resolution_days, None);
}

#[test]
fn channel_report_of_nothing_is_empty() {
    assert!(channel_performance(&[]).is_empty());
}

// ── Agent ────────────────────────────────────────────────────────────────────

/// Equal means share a rank; agents with nothing resolved are unranked and last.
#[test]
fn agents_get_dense_rank_by_mean_resolution() {
    let cfg = RiskConfig::default();
    let facts = vec![
        closed(handled_by(fact("1", "Web"), "A1", "billing"), 1),
        closed(handled_by(fact("2", "Web"), "A1", "billing"), 3),
        closed(handled_by(fact("3", "Web"), "A2", "hardware"), 2),
        closed(handled_by(fact("4", "Web"), "A3", "technical"), 5),
        handled_by(fact("5", "Web"), "A4", "unknown-skill"),
        fact("6", "Web"),
    ];
    let rows = agent_performance(&facts, &cfg);

    let got: Vec<(&str, Option<u32>)> = rows.iter().map(|r| (r.agent_id.as_str(), r.rank)).collect();
    assert_eq!(
        got,
        vec![("A1", Some(1)), ("A2", Some(1)), ("A3", Some(2)), ("A4", None)]
    );

    assert_eq!(rows[0].handled, 2);
    assert_eq!(rows[0].resolved, 2);
    assert_eq!(rows[0].mean_resolution_days, Some(2.0));
    assert_eq!(rows[1].product_area, "Devices");
    assert_eq!(rows[3].product_area, "General");
    assert_eq!(rows[3].mean_resolution_days, None);
}

/// Means that differ below display precision still get distinct ranks.
#[test]
fn agent_rank_uses_unrounded_mean() {
    let cfg = RiskConfig::default();
    let mut facts = vec![closed(handled_by(fact("fast", "Web"), "A2", "billing"), 0)];
    // A1: 999 same-day resolutions and one next-day one, mean 0.001 days.
    for i in 0..999 {
        facts.push(closed(handled_by(fact(&format!("s{i}"), "Web"), "A1", "billing"), 0));
    }
    facts.push(closed(handled_by(fact("slow", "Web"), "A1", "billing"), 1));

    let rows = agent_performance(&facts, &cfg);
    let got: Vec<(&str, Option<u32>, Option<f64>)> = rows
        .iter()
        .map(|r| (r.agent_id.as_str(), r.rank, r.mean_resolution_days))
        .collect();
    assert_eq!(
        got,
        vec![("A2", Some(1), Some(0.0)), ("A1", Some(2), Some(0.0))]
    );
}

/// A resolution dated before filing counts as zero days.
#[test]
fn resolution_before_filing_counts_as_zero_days() {
    let cfg = RiskConfig::default();
    let facts = vec![closed(handled_by(fact("early", "Web"), "A7", "logistics"), -4)];
    assert_eq!(facts[0].resolution_days(), Some(0));

    let rows = agent_performance(&facts, &cfg);
    assert_eq!(rows[0].mean_resolution_days, Some(0.0));
    assert_eq!(rows[0].rank, Some(1));

    let channels = channel_performance(&facts);
    assert_eq!(channels[0].mean_resolution_days, Some(0.0));
}

// ── Pareto ───────────────────────────────────────────────────────────────────

#[test]
fn pareto_marks_areas_up_to_the_cutoff() {
    let mut facts = Vec::new();
    for i in 0..5 {
        facts.push(in_area(fact(&format!("b{i}"), "Web"), Some("Billing")));
    }
    for i in 0..3 {
        facts.push(in_area(fact(&format!("d{i}"), "Web"), Some("Devices")));
    }
    facts.push(in_area(fact("l0", "Web"), Some("Delivery")));
    facts.push(in_area(fact("u0", "Web"), None));

    let rows = product_pareto(&facts);
    let got: Vec<(&str, u32, f64, bool)> = rows
        .iter()
        .map(|r| (r.product_area.as_str(), r.complaints, r.cumulative_pct, r.vital_few))
        .collect();
    assert_eq!(
        got,
        vec![
            ("Billing", 5, 50.0, true),
            ("Devices", 3, 80.0, true),
            ("Delivery", 1, 90.0, false),
            ("Unassigned", 1, 100.0, false),
        ]
    );
    assert_eq!(rows[0].share_pct, 50.0);
}

/// The area whose share crosses 80% still belongs to the vital few.
#[test]
fn pareto_includes_area_crossing_cutoff() {
    let mut facts = Vec::new();
    for i in 0..6 {
        facts.push(in_area(fact(&format!("a{i}"), "Web"), Some("Accounts")));
    }
    for i in 0..3 {
        facts.push(in_area(fact(&format!("c{i}"), "Web"), Some("Connectivity")));
    }
    facts.push(in_area(fact("x0", "Web"), Some("Billing")));

    let vital: Vec<bool> = product_pareto(&facts).iter().map(|r| r.vital_few).collect();
    assert_eq!(vital, vec![true, true, false]);
}

/// Cumulative share 79.996% displays as 80.00 but has not reached the
/// cutoff, so the next area is the one that crosses it.
#[test]
fn pareto_cutoff_uses_exact_share_not_rounded() {
    let mut facts = Vec::new();
    for (area, n) in [("Accounts", 16000), ("Billing", 3000), ("Connectivity", 1001)] {
        for i in 0..n {
            facts.push(in_area(fact(&format!("{area}-{i}"), "Web"), Some(area)));
        }
    }

    let rows = product_pareto(&facts);
    let got: Vec<(&str, f64, bool)> = rows
        .iter()
        .map(|r| (r.product_area.as_str(), r.cumulative_pct, r.vital_few))
        .collect();
    assert_eq!(
        got,
        vec![
            ("Accounts", 80.0, true),
            ("Billing", 95.0, true),
            ("Connectivity", 100.0, false),
        ]
    );
}

// ── Tenure cohort ────────────────────────────────────────────────────────────

#[test]
fn cohorts_follow_bucket_order_and_count_high_risk() {
    let tenures = [("t1", 20), ("t2", 60), ("t3", 300), ("t4", 900), ("t5", 1000)];
    let facts: Vec<ComplaintFact> = tenures
        .iter()
        .enumerate()
        .map(|(i, (id, tenure))| {
            let mut f = fact(id, "Web");
            f.signup_date = as_of() - Duration::days(*tenure);
            f.complaint_date = as_of() - Duration::days(i as i64 * 10);
            f
        })
        .collect();

    let scorer = RiskScorer::new(RiskConfig::default().model);
    let (profiles, _) = scorer.score_population(&facts, &DerivedOnly, as_of());
    let cohorts = tenure_cohorts(&profiles, 0.7);

    let buckets: Vec<(TenureBucket, u32)> = cohorts.iter().map(|c| (c.tenure_bucket, c.customers)).collect();
    assert_eq!(
        buckets,
        vec![
            (TenureBucket::UpTo3Months, 2),
            (TenureBucket::From6To12Months, 1),
            (TenureBucket::Over2Years, 2),
        ]
    );

    let total_high: u32 = cohorts.iter().map(|c| c.high_risk).sum();
    let expected_high = profiles.iter().filter(|p| p.normalized_risk_score >= 0.7).count() as u32;
    assert_eq!(total_high, expected_high);

    // Only the 20-day customer carries the new-customer bonus.
    assert_eq!(cohorts[0].high_risk, 1);
    assert_eq!(cohorts[0].customers, 2);
    assert!(cohorts[0].mean_normalized > cohorts[2].mean_normalized);
}
