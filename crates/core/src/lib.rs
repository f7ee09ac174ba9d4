pub mod config;
pub mod error;
pub mod filter;
pub mod types;

pub use config::AppConfig;
pub use error::{InsightsError, InsightsResult};
pub use filter::{ChannelFilter, ReportQuery, TimeRange};
pub use types::{
    Campaign, CampaignStatus, Channel, Contact, Event, EventPayload, EventType, InterestLevel,
    Snapshot, VariantSummary,
};
