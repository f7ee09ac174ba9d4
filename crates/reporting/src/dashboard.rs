//! Dashboard KPIs — contact interest, campaign activity and click-through.

use insights_core::types::{Campaign, CampaignStatus, Contact, Event, EventType, InterestLevel};
use serde::{Deserialize, Serialize};

/// Where `total_clicks` was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickSource {
    /// Count of `link_clicked` events.
    Events,
    /// Sum of campaign `click_count` totals.
    Campaigns,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiSnapshot {
    pub total_contacts: u64,
    pub interested_contacts: u64,
    pub interested_rate: f64,
    pub active_campaigns: u64,
    pub total_sent: u64,
    pub total_clicks: u64,
    pub click_source: ClickSource,
    pub average_ctr: f64,
}

/// Reduce a snapshot into dashboard KPIs. Every ratio with a zero
/// denominator is reported as 0.
pub fn aggregate_kpis(contacts: &[Contact], campaigns: &[Campaign], events: &[Event]) -> KpiSnapshot {
    let total_contacts = contacts.len() as u64;
    let interested_contacts = contacts
        .iter()
        .filter(|c| c.interest_level == InterestLevel::Interested)
        .count() as u64;
    let active_campaigns = campaigns
        .iter()
        .filter(|c| c.status == CampaignStatus::Running)
        .count() as u64;

    // The event log is authoritative only when it has recorded any clicks.
    let event_clicks = events.iter().filter(|e| e.is(EventType::LinkClicked)).count() as u64;
    let (total_clicks, click_source) = if event_clicks > 0 {
        (event_clicks, ClickSource::Events)
    } else {
        (
            saturating_total(campaigns, |c| c.click_count),
            ClickSource::Campaigns,
        )
    };
    let total_sent = saturating_total(campaigns, |c| c.sent_count);

    KpiSnapshot {
        total_contacts,
        interested_contacts,
        interested_rate: ratio(interested_contacts, total_contacts),
        active_campaigns,
        total_sent,
        total_clicks,
        click_source,
        average_ctr: ratio(total_clicks, total_sent),
    }
}

/// Campaign totals come from external counters; pin at `u64::MAX` rather
/// than overflow.
fn saturating_total(campaigns: &[Campaign], field: impl Fn(&Campaign) -> u64) -> u64 {
    campaigns
        .iter()
        .fold(0u64, |acc, c| acc.saturating_add(field(c)))
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator > 0 {
        numerator as f64 / denominator as f64
    } else {
        0.0
    }
}
