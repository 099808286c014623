use super::{date_text, RiskStore};
use crate::{
    error::{parse_date, RiskError, RiskResult},
    risk::{RiskComponents, RiskProfile, ScoreRange, TenureBucket},
};
use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoringRun {
    pub run_id:        String,
    pub as_of:         NaiveDate,
    pub model_version: String,
    pub customers:     i64,
    pub range:         Option<ScoreRange>,
}

fn bucket_from_label(label: &str) -> RiskResult<TenureBucket> {
    TenureBucket::ALL
        .into_iter()
        .find(|b| b.label() == label)
        .ok_or_else(|| RiskError::InvalidValue { field: "tenure_bucket", value: label.to_string() })
}

impl RiskStore {
    // ── Risk profiles ──────────────────────────────────────────────

    /// Replace the whole profile table with `profiles` in one transaction.
    pub fn replace_risk_profiles(&self, profiles: &[RiskProfile]) -> RiskResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM risk_profile", params![])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO risk_profile (
                    customer_id, segment, complaint_count, last_complaint_date,
                    volume_risk, severity_risk, recency_factor, is_new_customer,
                    customer_value, sentiment, avg_sentiment, frequency,
                    raw_risk_score, normalized_risk_score, tenure_days, tenure_bucket
                ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16)",
            )?;
            for p in profiles {
                stmt.execute(params![
                    &p.customer_id,
                    &p.segment,
                    p.complaint_count,
                    date_text(p.last_complaint_date),
                    p.components.volume_risk,
                    p.components.severity_risk,
                    p.components.recency_factor,
                    p.components.is_new_customer,
                    p.components.customer_value,
                    p.components.sentiment,
                    p.avg_sentiment,
                    p.frequency,
                    p.raw_risk_score,
                    p.normalized_risk_score,
                    p.tenure_days,
                    p.tenure_bucket.label(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn risk_profiles(&self) -> RiskResult<Vec<RiskProfile>> {
        let mut stmt = self.conn.prepare(
            "SELECT customer_id, segment, complaint_count, last_complaint_date,
                    volume_risk, severity_risk, recency_factor, is_new_customer,
                    customer_value, sentiment, avg_sentiment, frequency,
                    raw_risk_score, normalized_risk_score, tenure_days, tenure_bucket
             FROM risk_profile
             ORDER BY customer_id ASC",
        )?;
        let rows = stmt
            .query_map(params![], |row| {
                let profile = RiskProfile {
                    customer_id:     row.get(0)?,
                    segment:         row.get(1)?,
                    complaint_count: row.get(2)?,
                    // Filled in below once the text is parsed.
                    last_complaint_date: NaiveDate::MIN,
                    components: RiskComponents {
                        volume_risk:     row.get(4)?,
                        severity_risk:   row.get(5)?,
                        recency_factor:  row.get(6)?,
                        is_new_customer: row.get(7)?,
                        customer_value:  row.get(8)?,
                        sentiment:       row.get(9)?,
                    },
                    avg_sentiment:         row.get(10)?,
                    frequency:             row.get(11)?,
                    raw_risk_score:        row.get(12)?,
                    normalized_risk_score: row.get(13)?,
                    tenure_days:           row.get(14)?,
                    tenure_bucket:         TenureBucket::UpTo3Months,
                };
                Ok((profile, row.get::<_, String>(3)?, row.get::<_, String>(15)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(mut p, last, bucket)| {
                p.last_complaint_date = parse_date(&last)?;
                p.tenure_bucket = bucket_from_label(&bucket)?;
                Ok(p)
            })
            .collect()
    }

    pub fn risk_profile_count(&self) -> RiskResult<i64> {
        self.count("SELECT COUNT(*) FROM risk_profile")
    }

    // ── Scoring runs ───────────────────────────────────────────────

    pub fn record_scoring_run(&self, run: &ScoringRun) -> RiskResult<()> {
        self.conn.execute(
            "INSERT INTO scoring_run (run_id, as_of, model_version, customers, min_raw, max_raw)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(run_id) DO UPDATE SET
                model_version = excluded.model_version,
                customers = excluded.customers,
                min_raw = excluded.min_raw,
                max_raw = excluded.max_raw",
            params![
                &run.run_id,
                date_text(run.as_of),
                &run.model_version,
                run.customers,
                run.range.map(|r| r.min_raw),
                run.range.map(|r| r.max_raw),
            ],
        )?;
        Ok(())
    }

    pub fn latest_scoring_run(&self) -> RiskResult<Option<ScoringRun>> {
        let row = self
            .conn
            .query_row(
                "SELECT run_id, as_of, model_version, customers, min_raw, max_raw
                 FROM scoring_run
                 ORDER BY as_of DESC, run_id DESC LIMIT 1",
                params![],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, Option<f64>>(4)?,
                        row.get::<_, Option<f64>>(5)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(run_id, as_of, model_version, customers, min_raw, max_raw)| {
            Ok(ScoringRun {
                run_id,
                as_of: parse_date(&as_of)?,
                model_version,
                customers,
                range: min_raw.zip(max_raw).map(|(min_raw, max_raw)| ScoreRange { min_raw, max_raw }),
            })
        })
        .transpose()
    }
}
