//! Engagement trend — dense daily event counts over a fixed window.

use chrono::{DateTime, Duration, NaiveDate, TimeZone};
use insights_core::types::{Event, EventType};
use serde::{Deserialize, Serialize};

/// Event counts for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub contacts_created: u64,
    pub interests_detected: u64,
    pub links_clicked: u64,
}

impl TrendPoint {
    fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            contacts_created: 0,
            interests_detected: 0,
            links_clicked: 0,
        }
    }

    pub fn total(&self) -> u64 {
        self.contacts_created + self.interests_detected + self.links_clicked
    }
}

/// Build `days` buckets, oldest first, ending on the calendar day of
/// `reference` (inclusive). Events are assigned by calendar date in the
/// reference's timezone.
pub fn build_trend<Tz: TimeZone>(events: &[Event], days: u32, reference: &DateTime<Tz>) -> Vec<TrendPoint> {
    if days == 0 {
        return Vec::new();
    }

    let tz = reference.timezone();
    let end = reference.date_naive();
    let start = end
        .checked_sub_signed(Duration::days(i64::from(days) - 1))
        .unwrap_or(NaiveDate::MIN);

    let mut points: Vec<TrendPoint> = start
        .iter_days()
        .take(days as usize)
        .take_while(|date| *date <= end)
        .map(TrendPoint::empty)
        .collect();

    for event in events {
        let Some(kind) = event.event_type() else {
            continue;
        };
        let date = event.created_at.with_timezone(&tz).date_naive();
        if date < start || date > end {
            continue;
        }
        let Some(point) = points.get_mut((date - start).num_days() as usize) else {
            continue;
        };
        match kind {
            EventType::ContactCreated => point.contacts_created += 1,
            EventType::InterestDetected => point.interests_detected += 1,
            EventType::LinkClicked => point.links_clicked += 1,
            EventType::CampaignSent | EventType::CampaignOpened => {}
        }
    }

    points
}
