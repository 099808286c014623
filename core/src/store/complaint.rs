use super::{date_text, opt_date, RiskStore};
use crate::{
    complaint::{AgentRecord, ComplaintFact, ComplaintRecord, CustomerRecord},
    error::{parse_date, RiskResult},
    risk::ExternalSignals,
    synthetic::SyntheticDataset,
    types::CustomerId,
};
use rusqlite::params;
use std::collections::BTreeMap;

// Raw row as read from SQLite; dates and enums still text.
struct FactRow {
    complaint_id:      String,
    customer_id:       String,
    complaint_date:    String,
    resolution_date:   Option<String>,
    resolution_status: String,
    urgency:           String,
    sentiment_score:   Option<f64>,
    segment:           String,
    signup_date:       String,
    channel:           String,
    product_area:      Option<String>,
    agent_id:          Option<String>,
    agent_skillset:    Option<String>,
    description:       String,
}

impl FactRow {
    fn into_fact(self) -> RiskResult<ComplaintFact> {
        Ok(ComplaintFact {
            complaint_id:      self.complaint_id,
            customer_id:       self.customer_id,
            complaint_date:    parse_date(&self.complaint_date)?,
            resolution_date:   opt_date(self.resolution_date)?,
            resolution_status: self.resolution_status.parse()?,
            urgency:           self.urgency.parse()?,
            sentiment_score:   self.sentiment_score,
            segment:           self.segment,
            signup_date:       parse_date(&self.signup_date)?,
            channel:           self.channel,
            product_area:      self.product_area,
            agent_id:          self.agent_id,
            agent_skillset:    self.agent_skillset,
            description:       self.description,
        })
    }
}

impl RiskStore {
    // ── Customer / agent ───────────────────────────────────────────

    pub fn insert_customer(&self, c: &CustomerRecord) -> RiskResult<()> {
        self.conn.execute(
            "INSERT INTO customer (customer_id, name, segment, signup_date)
             VALUES (?1, ?2, ?3, ?4)",
            params![&c.customer_id, &c.name, &c.segment, date_text(c.signup_date)],
        )?;
        Ok(())
    }

    pub fn insert_agent(&self, a: &AgentRecord) -> RiskResult<()> {
        self.conn.execute(
            "INSERT INTO agent (agent_id, name, skillset) VALUES (?1, ?2, ?3)",
            params![&a.agent_id, &a.name, &a.skillset],
        )?;
        Ok(())
    }

    pub fn customer_count(&self) -> RiskResult<i64> {
        self.count("SELECT COUNT(*) FROM customer")
    }

    // ── Complaint ──────────────────────────────────────────────────

    pub fn insert_complaint(&self, c: &ComplaintRecord) -> RiskResult<()> {
        self.conn.execute(
            "INSERT INTO complaint (
                complaint_id, customer_id, agent_id, complaint_date, resolution_date,
                resolution_status, urgency, channel, product_area, description, sentiment_score
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                &c.complaint_id,
                &c.customer_id,
                c.agent_id.as_deref(),
                date_text(c.complaint_date),
                c.resolution_date.map(date_text),
                c.resolution_status.as_str(),
                c.urgency.as_str(),
                &c.channel,
                c.product_area.as_deref(),
                &c.description,
                c.sentiment_score,
            ],
        )?;
        Ok(())
    }

    pub fn complaint_count(&self) -> RiskResult<i64> {
        self.count("SELECT COUNT(*) FROM complaint")
    }

    /// Load a whole dataset in one transaction.
    pub fn insert_dataset(&self, data: &SyntheticDataset) -> RiskResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        for c in &data.customers {
            self.insert_customer(c)?;
        }
        for a in &data.agents {
            self.insert_agent(a)?;
        }
        for c in &data.complaints {
            self.insert_complaint(c)?;
        }
        tx.commit()?;
        log::debug!(
            "store: loaded {} customers, {} agents, {} complaints",
            data.customers.len(),
            data.agents.len(),
            data.complaints.len(),
        );
        Ok(())
    }

    /// The complaint fact stream: complaints joined to their customer
    /// (complaints without one are dropped) and agent (optional).
    pub fn complaint_facts(&self) -> RiskResult<Vec<ComplaintFact>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.complaint_id, c.customer_id, c.complaint_date, c.resolution_date,
                    c.resolution_status, c.urgency, c.sentiment_score,
                    cu.segment, cu.signup_date,
                    c.channel, c.product_area, c.agent_id, a.skillset, c.description
             FROM complaint c
             JOIN customer cu ON cu.customer_id = c.customer_id
             LEFT JOIN agent a ON a.agent_id = c.agent_id
             ORDER BY c.customer_id ASC, c.complaint_date ASC, c.complaint_id ASC",
        )?;
        let rows = stmt
            .query_map(params![], |row| {
                Ok(FactRow {
                    complaint_id:      row.get(0)?,
                    customer_id:       row.get(1)?,
                    complaint_date:    row.get(2)?,
                    resolution_date:   row.get(3)?,
                    resolution_status: row.get(4)?,
                    urgency:           row.get(5)?,
                    sentiment_score:   row.get(6)?,
                    segment:           row.get(7)?,
                    signup_date:       row.get(8)?,
                    channel:           row.get(9)?,
                    product_area:      row.get(10)?,
                    agent_id:          row.get(11)?,
                    agent_skillset:    row.get(12)?,
                    description:       row.get(13)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(FactRow::into_fact).collect()
    }

    // ── External signals ───────────────────────────────────────────

    pub fn upsert_signal(&self, customer_id: &str, signals: &ExternalSignals) -> RiskResult<()> {
        self.conn.execute(
            "INSERT INTO customer_signal (customer_id, volume_risk, severity_risk)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(customer_id) DO UPDATE SET
                volume_risk = excluded.volume_risk,
                severity_risk = excluded.severity_risk",
            params![customer_id, signals.volume_risk, signals.severity_risk],
        )?;
        Ok(())
    }

    pub fn customer_signals(&self) -> RiskResult<BTreeMap<CustomerId, ExternalSignals>> {
        let mut stmt = self.conn.prepare(
            "SELECT customer_id, volume_risk, severity_risk FROM customer_signal",
        )?;
        let signals = stmt
            .query_map(params![], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    ExternalSignals {
                        volume_risk:   row.get(1)?,
                        severity_risk: row.get(2)?,
                    },
                ))
            })?
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        Ok(signals)
    }
}
