//! Deterministic synthetic dataset: customers, agents and complaints.
//!
//! Same seed + same spec + same as-of date = identical dataset, down to the
//! complaint ids. Used by `risk-runner seed` and by the tests.

use crate::{
    complaint::{AgentRecord, ComplaintRecord, CustomerRecord},
    config::RiskConfig,
    rng::{Stream, StreamRng},
    sentiment,
    types::{ResolutionStatus, Urgency},
};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

const CHANNELS: [&str; 5] = ["Email", "Phone", "Web", "Social", "Chat"];
const FIRST_NAMES: [&str; 12] = [
    "Alex", "Jordan", "Sam", "Taylor", "Morgan", "Casey",
    "Riley", "Jamie", "Avery", "Quinn", "Rowan", "Devon",
];
const LAST_NAMES: [&str; 12] = [
    "Okafor", "Nguyen", "Silva", "Kowalski", "Haddad", "Lindqvist",
    "Moreau", "Tanaka", "Brennan", "Patel", "Ortiz", "Novak",
];
const FILLER: [&str; 6] = [
    "regarding my account",
    "on my last order",
    "after the recent update",
    "since last week",
    "with the mobile app",
    "on the monthly plan",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticSpec {
    pub customers:          usize,
    pub agents:             usize,
    pub premium_share:      f64,
    pub history_days:       i64,
    pub max_tenure_days:    i64,
    pub max_complaints:     u64,
    pub unassigned_share:   f64,
}

impl Default for SyntheticSpec {
    fn default() -> Self {
        Self {
            customers:        200,
            agents:           8,
            premium_share:    0.25,
            history_days:     365,
            max_tenure_days:  1095,
            max_complaints:   6,
            unassigned_share: 0.10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyntheticDataset {
    pub customers:  Vec<CustomerRecord>,
    pub agents:     Vec<AgentRecord>,
    pub complaints: Vec<ComplaintRecord>,
}

impl SyntheticDataset {
    pub fn generate(seed: u64, spec: &SyntheticSpec, as_of: NaiveDate, config: &RiskConfig) -> Self {
        let mut customer_rng = Stream::Customer.rng(seed);
        let mut agent_rng = Stream::Agent.rng(seed);
        let mut complaint_rng = Stream::Complaint.rng(seed);

        let customers: Vec<CustomerRecord> = (0..spec.customers)
            .map(|i| make_customer(i, spec, as_of, &mut customer_rng))
            .collect();

        let mut skillsets: Vec<&str> = config.skillset_products.keys().map(String::as_str).collect();
        skillsets.sort_unstable();
        if skillsets.is_empty() {
            skillsets.push("general");
        }
        let agents: Vec<AgentRecord> = (0..spec.agents)
            .map(|i| AgentRecord {
                agent_id: format!("A{i:03}"),
                name:     full_name(&mut agent_rng),
                skillset: agent_rng.pick(&skillsets).to_string(),
            })
            .collect();

        let mut complaints = Vec::new();
        for customer in &customers {
            let count = complaint_rng.next_u64_below(spec.max_complaints + 1);
            for _ in 0..count {
                complaints.push(make_complaint(customer, &agents, spec, as_of, config, &mut complaint_rng));
            }
        }

        log::info!(
            "synthetic: seed={seed} customers={} agents={} complaints={}",
            customers.len(),
            agents.len(),
            complaints.len(),
        );

        Self { customers, agents, complaints }
    }
}

fn full_name(rng: &mut StreamRng) -> String {
    format!("{} {}", rng.pick(&FIRST_NAMES), rng.pick(&LAST_NAMES))
}

fn make_customer(i: usize, spec: &SyntheticSpec, as_of: NaiveDate, rng: &mut StreamRng) -> CustomerRecord {
    let segment = if rng.chance(spec.premium_share) { "Premium" } else { "Standard" };
    let tenure = rng.next_u64_below(spec.max_tenure_days.max(1) as u64) as i64;
    CustomerRecord {
        customer_id: format!("C{i:05}"),
        name:        full_name(rng),
        segment:     segment.to_string(),
        signup_date: as_of - Duration::days(tenure),
    }
}

fn make_complaint(
    customer: &CustomerRecord,
    agents: &[AgentRecord],
    spec: &SyntheticSpec,
    as_of: NaiveDate,
    config: &RiskConfig,
    rng: &mut StreamRng,
) -> ComplaintRecord {
    let complaint_id = uuid::Builder::from_random_bytes(rng.next_bytes16())
        .into_uuid()
        .to_string();

    let earliest = customer.signup_date.max(as_of - Duration::days(spec.history_days));
    let span = (as_of - earliest).num_days().max(0) as u64;
    let complaint_date = earliest + Duration::days(rng.next_u64_below(span + 1) as i64);
    let age = (as_of - complaint_date).num_days();

    let urgency = match rng.weighted_index(&[0.4, 0.4, 0.2]) {
        0 => Urgency::Low,
        1 => Urgency::Medium,
        _ => Urgency::High,
    };

    let resolution_status = if age < 3 {
        if rng.chance(0.6) { ResolutionStatus::Open } else { ResolutionStatus::Pending }
    } else {
        match rng.weighted_index(&[0.8, 0.1, 0.1]) {
            0 => ResolutionStatus::Closed,
            1 => ResolutionStatus::Pending,
            _ => ResolutionStatus::Open,
        }
    };
    let resolution_date = (resolution_status == ResolutionStatus::Closed).then(|| {
        let days = rng.next_u64_below(15) as i64;
        (complaint_date + Duration::days(days)).min(as_of)
    });

    let agent = if agents.is_empty() || rng.chance(spec.unassigned_share) {
        None
    } else {
        Some(rng.pick(agents))
    };
    let product_area = agent.map(|a| config.product_area_for_skillset(&a.skillset).to_string());

    let description = if config.sentiment_keywords.is_empty() {
        rng.pick(&FILLER).to_string()
    } else {
        let kw = rng.pick(&config.sentiment_keywords);
        format!("{} {}", kw.keyword, rng.pick(&FILLER))
    };
    let sentiment_score = sentiment::average_sentiment(&config.sentiment_keywords, &description);

    ComplaintRecord {
        complaint_id,
        customer_id: customer.customer_id.clone(),
        agent_id: agent.map(|a| a.agent_id.clone()),
        complaint_date,
        resolution_date,
        resolution_status,
        urgency,
        channel: rng.pick(&CHANNELS).to_string(),
        product_area,
        description,
        sentiment_score,
    }
}
