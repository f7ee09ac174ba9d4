//! Engagement reporting — dashboard KPIs, daily engagement trends and
//! A/B significance testing over read-only snapshots.

pub mod dashboard;
pub mod engine;
pub mod significance;
pub mod sink;
pub mod stats;
pub mod trend;

pub use dashboard::{aggregate_kpis, ClickSource, KpiSnapshot};
pub use engine::{DashboardReport, InsightsEngine};
pub use significance::{evaluate, SignificanceResult, SIGNIFICANCE_LEVEL};
pub use sink::{DataQualityIssue, InsightsSink, NoopSink, TracingSink};
pub use trend::{build_trend, TrendPoint};
