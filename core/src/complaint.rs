//! Complaint, customer and agent records, and the joined complaint fact.
//!
//! The store persists the three base records. The scoring engine and the
//! reports only ever see `ComplaintFact`: one complaint with its customer
//! attributes already joined in.

use crate::types::{AgentId, ComplaintId, CustomerId, ResolutionStatus, Urgency};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerRecord {
    pub customer_id: CustomerId,
    pub name:        String,
    pub segment:     String,
    pub signup_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentRecord {
    pub agent_id: AgentId,
    pub name:     String,
    pub skillset: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComplaintRecord {
    pub complaint_id:      ComplaintId,
    pub customer_id:       CustomerId,
    pub agent_id:          Option<AgentId>,
    pub complaint_date:    NaiveDate,
    pub resolution_date:   Option<NaiveDate>,
    pub resolution_status: ResolutionStatus,
    pub urgency:           Urgency,
    pub channel:           String,
    pub product_area:      Option<String>,
    pub description:       String,
    pub sentiment_score:   Option<f64>,
}

/// One complaint joined with its owning customer (and agent, if assigned).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComplaintFact {
    pub complaint_id:      ComplaintId,
    pub customer_id:       CustomerId,
    pub complaint_date:    NaiveDate,
    pub resolution_date:   Option<NaiveDate>,
    pub resolution_status: ResolutionStatus,
    pub urgency:           Urgency,
    pub sentiment_score:   Option<f64>,
    pub segment:           String,
    pub signup_date:       NaiveDate,
    pub channel:           String,
    pub product_area:      Option<String>,
    pub agent_id:          Option<AgentId>,
    pub agent_skillset:    Option<String>,
    pub description:       String,
}

impl ComplaintFact {
    /// Build a fact from its base records.
    pub fn join(
        complaint: &ComplaintRecord,
        customer: &CustomerRecord,
        agent: Option<&AgentRecord>,
    ) -> Self {
        Self {
            complaint_id:      complaint.complaint_id.clone(),
            customer_id:       complaint.customer_id.clone(),
            complaint_date:    complaint.complaint_date,
            resolution_date:   complaint.resolution_date,
            resolution_status: complaint.resolution_status,
            urgency:           complaint.urgency,
            sentiment_score:   complaint.sentiment_score,
            segment:           customer.segment.clone(),
            signup_date:       customer.signup_date,
            channel:           complaint.channel.clone(),
            product_area:      complaint.product_area.clone(),
            agent_id:          agent.map(|a| a.agent_id.clone()),
            agent_skillset:    agent.map(|a| a.skillset.clone()),
            description:       complaint.description.clone(),
        }
    }

    /// Days from filing to resolution. A resolution dated before the
    /// complaint counts as zero days.
    pub fn resolution_days(&self) -> Option<i64> {
        self.resolution_date
            .map(|resolved| (resolved - self.complaint_date).num_days().max(0))
    }

    /// True when the complaint was filed within `[start, end]`.
    pub fn filed_between(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.complaint_date >= start && self.complaint_date <= end
    }
}

/// Inner-join complaints to customers (and left-join agents).
/// Complaints whose customer is unknown are dropped.
pub fn join_facts(
    complaints: &[ComplaintRecord],
    customers: &[CustomerRecord],
    agents: &[AgentRecord],
) -> Vec<ComplaintFact> {
    use std::collections::HashMap;

    let by_customer: HashMap<&str, &CustomerRecord> =
        customers.iter().map(|c| (c.customer_id.as_str(), c)).collect();
    let by_agent: HashMap<&str, &AgentRecord> =
        agents.iter().map(|a| (a.agent_id.as_str(), a)).collect();

    let mut dropped = 0usize;
    let mut facts: Vec<ComplaintFact> = complaints
        .iter()
        .filter_map(|c| {
            let Some(customer) = by_customer.get(c.customer_id.as_str()) else {
                dropped += 1;
                return None;
            };
            let agent = c.agent_id.as_deref().and_then(|id| by_agent.get(id).copied());
            Some(ComplaintFact::join(c, customer, agent))
        })
        .collect();

    if dropped > 0 {
        log::debug!("join_facts: dropped {dropped} complaints with unknown customer");
    }

    facts.sort_by(|a, b| {
        a.customer_id
            .cmp(&b.customer_id)
            .then(a.complaint_date.cmp(&b.complaint_date))
            .then(a.complaint_id.cmp(&b.complaint_id))
    });
    facts
}
