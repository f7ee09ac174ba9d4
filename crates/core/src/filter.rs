//! Request-scoped filters applied to a snapshot before aggregation.

use crate::error::InsightsError;
use crate::types::{Channel, Contact, Event, Snapshot};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Look-back window selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "7d")]
    Last7Days,
    #[serde(rename = "30d")]
    Last30Days,
    #[serde(rename = "90d")]
    Last90Days,
    #[default]
    #[serde(rename = "all")]
    All,
}

impl TimeRange {
    pub fn days(&self) -> Option<u32> {
        match self {
            TimeRange::Last7Days => Some(7),
            TimeRange::Last30Days => Some(30),
            TimeRange::Last90Days => Some(90),
            TimeRange::All => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Last7Days => "7d",
            TimeRange::Last30Days => "30d",
            TimeRange::Last90Days => "90d",
            TimeRange::All => "all",
        }
    }
}

impl FromStr for TimeRange {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "7d" => Ok(TimeRange::Last7Days),
            "30d" => Ok(TimeRange::Last30Days),
            "90d" => Ok(TimeRange::Last90Days),
            "all" | "" => Ok(TimeRange::All),
            _ => Err(InsightsError::UnsupportedFilter {
                kind: "time range",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Channel selector. `All` disables channel filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelFilter {
    #[default]
    All,
    Only(Channel),
}

impl ChannelFilter {
    pub fn matches(&self, channel: Channel) -> bool {
        match self {
            ChannelFilter::All => true,
            ChannelFilter::Only(wanted) => *wanted == channel,
        }
    }
}

impl FromStr for ChannelFilter {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "" => Ok(ChannelFilter::All),
            "instagram" => Ok(ChannelFilter::Only(Channel::Instagram)),
            "facebook" => Ok(ChannelFilter::Only(Channel::Facebook)),
            _ => Err(InsightsError::UnsupportedFilter {
                kind: "channel",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ChannelFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelFilter::All => f.write_str("all"),
            ChannelFilter::Only(channel) => f.write_str(channel.as_str()),
        }
    }
}

/// Filters and reference instant for a single report request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportQuery {
    pub time_range: TimeRange,
    pub channel: ChannelFilter,
    pub now: DateTime<Utc>,
}

impl ReportQuery {
    pub fn new(time_range: TimeRange, channel: ChannelFilter, now: DateTime<Utc>) -> Self {
        Self {
            time_range,
            channel,
            now,
        }
    }

    /// Unfiltered query anchored at the current instant.
    pub fn all() -> Self {
        Self::new(TimeRange::All, ChannelFilter::All, Utc::now())
    }

    /// Earliest timestamp retained by the time range, if bounded.
    pub fn since(&self) -> Option<DateTime<Utc>> {
        self.time_range
            .days()
            .map(|days| self.now - Duration::days(i64::from(days)))
    }

    fn in_window(&self, at: DateTime<Utc>) -> bool {
        self.since().map_or(true, |since| at >= since)
    }

    fn keeps_contact(&self, contact: &Contact) -> bool {
        self.channel.matches(contact.source) && self.in_window(contact.created_at)
    }

    /// Events tied to a contact follow that contact's channel. Unattributed
    /// events are only subject to the time window.
    fn keeps_event(&self, event: &Event, channel_ids: Option<&HashSet<Uuid>>) -> bool {
        if !self.in_window(event.created_at) {
            return false;
        }
        match (channel_ids, event.contact_id) {
            (Some(ids), Some(contact_id)) => ids.contains(&contact_id),
            _ => true,
        }
    }
}

impl Snapshot {
    /// Copy of the snapshot restricted to the query's time range and channel.
    /// Campaigns carry running totals and are never filtered.
    pub fn filtered(&self, query: &ReportQuery) -> Snapshot {
        // Channel membership is judged on every contact, not only those in
        // the time window, so old contacts still attribute recent events.
        let channel_ids: Option<HashSet<Uuid>> = match query.channel {
            ChannelFilter::All => None,
            ChannelFilter::Only(channel) => Some(
                self.contacts
                    .iter()
                    .filter(|c| c.source == channel)
                    .map(|c| c.id)
                    .collect(),
            ),
        };

        Snapshot {
            contacts: self
                .contacts
                .iter()
                .filter(|c| query.keeps_contact(c))
                .cloned()
                .collect(),
            campaigns: self.campaigns.clone(),
            events: self
                .events
                .iter()
                .filter(|e| query.keeps_event(e, channel_ids.as_ref()))
                .cloned()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        Campaign, CampaignSent, CampaignStatus, EventPayload, InterestLevel, LinkClicked,
    };
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    fn contact(source: Channel, days_ago: i64) -> Contact {
        Contact {
            id: Uuid::new_v4(),
            handle: None,
            source,
            interest_level: InterestLevel::Neutral,
            created_at: now() - Duration::days(days_ago),
        }
    }

    fn click(days_ago: i64) -> Event {
        Event::new(
            EventPayload::LinkClicked(LinkClicked::default()),
            now() - Duration::days(days_ago),
        )
    }

    #[test]
    fn test_parse_time_range() {
        assert_eq!("7d".parse::<TimeRange>().unwrap(), TimeRange::Last7Days);
        assert_eq!("30D".parse::<TimeRange>().unwrap(), TimeRange::Last30Days);
        assert_eq!("90d".parse::<TimeRange>().unwrap(), TimeRange::Last90Days);
        assert_eq!("all".parse::<TimeRange>().unwrap(), TimeRange::All);
        assert!(matches!(
            "1y".parse::<TimeRange>(),
            Err(InsightsError::UnsupportedFilter { kind: "time range", .. })
        ));
    }

    #[test]
    fn test_parse_channel() {
        assert_eq!("all".parse::<ChannelFilter>().unwrap(), ChannelFilter::All);
        assert_eq!(
            "Instagram".parse::<ChannelFilter>().unwrap(),
            ChannelFilter::Only(Channel::Instagram)
        );
        assert_eq!(
            "facebook".parse::<ChannelFilter>().unwrap(),
            ChannelFilter::Only(Channel::Facebook)
        );
        assert!("tiktok".parse::<ChannelFilter>().is_err());
        assert_eq!(ChannelFilter::Only(Channel::Facebook).to_string(), "facebook");
    }

    #[test]
    fn test_time_window_filter() {
        let snapshot = Snapshot {
            contacts: vec![contact(Channel::Instagram, 1), contact(Channel::Instagram, 20)],
            campaigns: vec![],
            events: vec![click(0), click(6), click(8), click(45)],
        };

        let week = snapshot.filtered(&ReportQuery::new(
            TimeRange::Last7Days,
            ChannelFilter::All,
            now(),
        ));
        assert_eq!(week.contacts.len(), 1);
        assert_eq!(week.events.len(), 2);

        let month = snapshot.filtered(&ReportQuery::new(
            TimeRange::Last30Days,
            ChannelFilter::All,
            now(),
        ));
        assert_eq!(month.contacts.len(), 2);
        assert_eq!(month.events.len(), 3);

        let all = snapshot.filtered(&ReportQuery::new(TimeRange::All, ChannelFilter::All, now()));
        assert_eq!(all.events.len(), 4);
    }

    #[test]
    fn test_channel_filter_follows_contact() {
        let insta = contact(Channel::Instagram, 40);
        let fb = contact(Channel::Facebook, 1);
        let snapshot = Snapshot {
            contacts: vec![insta.clone(), fb.clone()],
            campaigns: vec![Campaign {
                id: Uuid::new_v4(),
                name: "Launch".to_string(),
                status: CampaignStatus::Running,
                sent_count: 10,
                click_count: 2,
                created_at: now(),
            }],
            events: vec![
                click(1).with_contact(insta.id),
                click(1).with_contact(fb.id),
                click(1),
            ],
        };

        let filtered = snapshot.filtered(&ReportQuery::new(
            TimeRange::Last7Days,
            ChannelFilter::Only(Channel::Instagram),
            now(),
        ));
        // The instagram contact is outside the window but still owns its event.
        assert!(filtered.contacts.is_empty());
        assert_eq!(filtered.events.len(), 2);
        assert!(filtered
            .events
            .iter()
            .all(|e| e.contact_id.map_or(true, |id| id == insta.id)));
        assert_eq!(filtered.campaigns.len(), 1);
    }

    #[test]
    fn test_unfiltered_query_keeps_everything() {
        let campaign_id = Uuid::new_v4();
        let old = contact(Channel::Facebook, 400);
        let snapshot = Snapshot {
            contacts: vec![old.clone(), contact(Channel::Instagram, 0)],
            campaigns: vec![],
            events: vec![
                click(400).with_contact(old.id),
                Event::new(
                    EventPayload::CampaignSent(CampaignSent { recipients: Some(50) }),
                    now() - Duration::days(200),
                )
                .with_campaign(campaign_id),
            ],
        };

        let query = ReportQuery::all();
        assert_eq!(query.time_range, TimeRange::All);
        assert_eq!(query.channel, ChannelFilter::All);
        assert_eq!(query.since(), None);

        let filtered = snapshot.filtered(&query);
        assert_eq!(filtered.contacts.len(), 2);
        assert_eq!(filtered.events, snapshot.events);
        assert_eq!(filtered.events[1].campaign_id, Some(campaign_id));
        assert_eq!(filtered.events[1].contact_id, None);
    }
}
