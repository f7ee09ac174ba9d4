//! Engine facade — applies request filters, runs the derivations and
//! reports each one to the configured sink.

use crate::dashboard::{aggregate_kpis, KpiSnapshot};
use crate::significance::{evaluate, SignificanceResult};
use crate::sink::{DataQualityIssue, InsightsSink, TracingSink};
use crate::trend::{build_trend, TrendPoint};
use chrono::{DateTime, Utc};
use insights_core::config::AppConfig;
use insights_core::error::{InsightsError, InsightsResult};
use insights_core::filter::{ChannelFilter, ReportQuery, TimeRange};
use insights_core::types::{Campaign, Event, Snapshot, VariantSummary};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

/// Longest trend window the engine will build.
pub const MAX_TREND_DAYS: u32 = 3_660;

/// Everything the dashboard page needs for one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardReport {
    pub time_range: TimeRange,
    pub channel: ChannelFilter,
    pub kpis: KpiSnapshot,
    pub trend: Vec<TrendPoint>,
    pub data_quality: Vec<DataQualityIssue>,
    pub generated_at: DateTime<Utc>,
}

pub struct InsightsEngine {
    config: AppConfig,
    sink: Arc<dyn InsightsSink>,
}

impl InsightsEngine {
    pub fn new(config: AppConfig, sink: Arc<dyn InsightsSink>) -> Self {
        Self { config, sink }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Build a query from raw selectors. Unrecognised values are reported
    /// to the sink and treated as "all".
    pub fn query(&self, time_range: &str, channel: &str, now: DateTime<Utc>) -> ReportQuery {
        ReportQuery::new(self.lenient(time_range), self.lenient(channel), now)
    }

    /// Query built from the configured default selectors.
    pub fn default_query(&self, now: DateTime<Utc>) -> ReportQuery {
        self.query(&self.config.query.time_range, &self.config.query.channel, now)
    }

    fn lenient<T>(&self, raw: &str) -> T
    where
        T: FromStr<Err = InsightsError> + Default,
    {
        match raw.parse() {
            Ok(value) => value,
            Err(InsightsError::UnsupportedFilter { kind, value }) => {
                self.sink.unsupported_filter(kind, &value);
                T::default()
            }
            Err(other) => {
                warn!(error = %other, value = raw, "Selector rejected, using default");
                self.sink.unsupported_filter("selector", raw);
                T::default()
            }
        }
    }

    /// KPIs over the filtered snapshot.
    pub fn kpis(&self, snapshot: &Snapshot, query: &ReportQuery) -> KpiSnapshot {
        let filtered = snapshot.filtered(query);
        let kpis = aggregate_kpis(&filtered.contacts, &filtered.campaigns, &filtered.events);
        self.sink.kpis_computed(&kpis);
        kpis
    }

    /// Daily trend ending on the calendar day of `now`, in the configured
    /// calendar offset.
    pub fn trend(&self, events: &[Event], days: u32, now: DateTime<Utc>) -> InsightsResult<Vec<TrendPoint>> {
        if days == 0 || days > MAX_TREND_DAYS {
            return Err(InsightsError::Validation(format!(
                "trend window must be between 1 and {} days, got {}",
                MAX_TREND_DAYS, days
            )));
        }
        let reference = now.with_timezone(&self.config.trend.offset());
        let points = build_trend(events, days, &reference);
        self.sink.trend_built(days, &points);
        Ok(points)
    }

    /// Full dashboard: KPIs and trend over the query window, plus any
    /// data-quality findings on the campaigns.
    pub fn dashboard(&self, snapshot: &Snapshot, query: &ReportQuery) -> InsightsResult<DashboardReport> {
        let filtered = snapshot.filtered(query);
        debug!(
            time_range = %query.time_range,
            channel = %query.channel,
            contacts = filtered.contacts.len(),
            campaigns = filtered.campaigns.len(),
            events = filtered.events.len(),
            "Snapshot filtered"
        );

        let data_quality = DataQualityIssue::scan_campaigns(&filtered.campaigns);
        for issue in &data_quality {
            self.sink.data_quality_issue(issue);
        }

        let kpis = aggregate_kpis(&filtered.contacts, &filtered.campaigns, &filtered.events);
        self.sink.kpis_computed(&kpis);

        let days = query
            .time_range
            .days()
            .unwrap_or(self.config.trend.default_days);
        let trend = self.trend(&filtered.events, days, query.now)?;

        Ok(DashboardReport {
            time_range: query.time_range,
            channel: query.channel,
            kpis,
            trend,
            data_quality,
            generated_at: query.now,
        })
    }

    pub fn significance(&self, variant_a: &VariantSummary, variant_b: &VariantSummary) -> InsightsResult<SignificanceResult> {
        let result = evaluate(variant_a, variant_b)?;
        self.sink.significance_evaluated(&result);
        Ok(result)
    }

    /// Significance of the click rates of two campaigns.
    pub fn compare_campaigns(&self, campaign_a: &Campaign, campaign_b: &Campaign) -> InsightsResult<SignificanceResult> {
        self.significance(&campaign_a.into(), &campaign_b.into())
    }
}

impl Default for InsightsEngine {
    fn default() -> Self {
        Self::new(AppConfig::default(), Arc::new(TracingSink))
    }
}
