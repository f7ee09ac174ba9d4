//! Observability hooks for the insights engine.

use crate::dashboard::KpiSnapshot;
use crate::significance::SignificanceResult;
use crate::trend::TrendPoint;
use insights_core::types::Campaign;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A record that was accepted but looks wrong.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataQualityIssue {
    ExcessClicks {
        campaign_id: Uuid,
        sent_count: u64,
        click_count: u64,
    },
}

impl DataQualityIssue {
    pub fn scan_campaigns(campaigns: &[Campaign]) -> Vec<DataQualityIssue> {
        campaigns
            .iter()
            .filter(|c| c.has_excess_clicks())
            .map(|c| DataQualityIssue::ExcessClicks {
                campaign_id: c.id,
                sent_count: c.sent_count,
                click_count: c.click_count,
            })
            .collect()
    }
}

/// Receives notifications about every derivation the engine performs.
/// Implementations must not fail or block.
pub trait InsightsSink: Send + Sync {
    fn kpis_computed(&self, kpis: &KpiSnapshot);
    fn trend_built(&self, days: u32, points: &[TrendPoint]);
    fn significance_evaluated(&self, result: &SignificanceResult);
    fn data_quality_issue(&self, issue: &DataQualityIssue);
    fn unsupported_filter(&self, kind: &str, value: &str);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl InsightsSink for NoopSink {
    fn kpis_computed(&self, _kpis: &KpiSnapshot) {}
    fn trend_built(&self, _days: u32, _points: &[TrendPoint]) {}
    fn significance_evaluated(&self, _result: &SignificanceResult) {}
    fn data_quality_issue(&self, _issue: &DataQualityIssue) {}
    fn unsupported_filter(&self, _kind: &str, _value: &str) {}
}

/// Structured logs through `tracing` plus counters through `metrics`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl InsightsSink for TracingSink {
    fn kpis_computed(&self, kpis: &KpiSnapshot) {
        metrics::counter!("insights.kpis.computed").increment(1);
        info!(
            total_contacts = kpis.total_contacts,
            interested_rate = kpis.interested_rate,
            active_campaigns = kpis.active_campaigns,
            total_clicks = kpis.total_clicks,
            click_source = ?kpis.click_source,
            average_ctr = kpis.average_ctr,
            "Dashboard KPIs computed"
        );
    }

    fn trend_built(&self, days: u32, points: &[TrendPoint]) {
        metrics::counter!("insights.trend.built").increment(1);
        let events: u64 = points.iter().map(TrendPoint::total).sum();
        metrics::histogram!("insights.trend.events").record(events as f64);
        debug!(days, events, "Engagement trend built");
    }

    fn significance_evaluated(&self, result: &SignificanceResult) {
        metrics::counter!("insights.significance.evaluated").increment(1);
        if result.is_significant {
            metrics::counter!("insights.significance.significant").increment(1);
        }
        info!(
            p_value = result.p_value,
            z_score = result.z_score,
            is_significant = result.is_significant,
            "Significance evaluated"
        );
    }

    fn data_quality_issue(&self, issue: &DataQualityIssue) {
        metrics::counter!("insights.data_quality.issues").increment(1);
        match issue {
            DataQualityIssue::ExcessClicks {
                campaign_id,
                sent_count,
                click_count,
            } => warn!(
                %campaign_id,
                sent_count,
                click_count,
                "Campaign reports more clicks than sends"
            ),
        }
    }

    fn unsupported_filter(&self, kind: &str, value: &str) {
        metrics::counter!("insights.filters.unsupported").increment(1);
        warn!(kind, value, "Unsupported filter, falling back to all");
    }
}
