//! Benchmarks for dashboard aggregation over a synthetic snapshot.
//! Run with: cargo bench -p insights-reporting

use chrono::{Duration, Utc};
use insights_core::types::{
    Campaign, CampaignStatus, Channel, Contact, Event, EventPayload, InterestDetected,
    InterestLevel, LinkClicked, Snapshot,
};
use insights_reporting::{InsightsEngine, NoopSink};
use std::sync::Arc;
use uuid::Uuid;

fn synthetic_snapshot(contacts: usize, events_per_contact: usize) -> Snapshot {
    let now = Utc::now();
    let contacts: Vec<Contact> = (0..contacts)
        .map(|i| Contact {
            id: Uuid::new_v4(),
            handle: None,
            source: if i % 3 == 0 { Channel::Facebook } else { Channel::Instagram },
            interest_level: match i % 4 {
                0 => InterestLevel::Interested,
                1 => InterestLevel::NotInterested,
                _ => InterestLevel::Neutral,
            },
            created_at: now - Duration::hours((i % 2_000) as i64),
        })
        .collect();

    let events = contacts
        .iter()
        .enumerate()
        .flat_map(|(i, c)| {
            (0..events_per_contact).map(move |j| {
                let payload = if j % 2 == 0 {
                    EventPayload::LinkClicked(LinkClicked::default())
                } else {
                    EventPayload::InterestDetected(InterestDetected::default())
                };
                Event::new(payload, now - Duration::hours(((i + j) % 2_000) as i64))
                    .with_contact(c.id)
            })
        })
        .collect();

    let campaigns = (0..50)
        .map(|i| Campaign {
            id: Uuid::new_v4(),
            name: format!("campaign-{:02}", i),
            status: if i % 2 == 0 { CampaignStatus::Running } else { CampaignStatus::Completed },
            sent_count: 10_000,
            click_count: 400 + i,
            created_at: now,
        })
        .collect();

    Snapshot {
        contacts,
        campaigns,
        events,
    }
}

fn main() {
    let engine = InsightsEngine::new(Default::default(), Arc::new(NoopSink));
    let snapshot = synthetic_snapshot(20_000, 5);
    let query = engine.query("30d", "instagram", Utc::now());

    // Warmup
    for _ in 0..3 {
        engine.dashboard(&snapshot, &query).unwrap();
    }

    let iterations = 50u32;
    let start = std::time::Instant::now();

    for _ in 0..iterations {
        let _ = engine.dashboard(&snapshot, &query).unwrap();
    }

    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations;

    println!("=== Dashboard Benchmark ===");
    println!("Iterations:  {}", iterations);
    println!("Total time:  {:?}", elapsed);
    println!("Per call:    {:?}", per_iter);
    println!("Contacts:    {}", snapshot.contacts.len());
    println!("Events:      {}", snapshot.events.len());
}
