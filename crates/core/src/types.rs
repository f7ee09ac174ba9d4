use crate::error::InsightsError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Social channel a contact was acquired through.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Instagram,
    Facebook,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Instagram => "instagram",
            Channel::Facebook => "facebook",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum InterestLevel {
    Interested,
    NotInterested,
    Neutral,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Draft,
    Running,
    Paused,
    Completed,
}

/// A contact record as supplied by the data store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub id: Uuid,
    #[serde(default)]
    pub handle: Option<String>,
    pub source: Channel,
    pub interest_level: InterestLevel,
    pub created_at: DateTime<Utc>,
}

/// A campaign with its running send/click totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    pub status: CampaignStatus,
    #[serde(default)]
    pub sent_count: u64,
    #[serde(default)]
    pub click_count: u64,
    pub created_at: DateTime<Utc>,
}

impl Campaign {
    /// Clicks recorded beyond the number of sends. Not fatal, but reported.
    pub fn has_excess_clicks(&self) -> bool {
        self.click_count > self.sent_count
    }
}

/// Known event kinds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    ContactCreated,
    InterestDetected,
    CampaignSent,
    LinkClicked,
    CampaignOpened,
}

impl EventType {
    pub const ALL: [EventType; 5] = [
        EventType::ContactCreated,
        EventType::InterestDetected,
        EventType::CampaignSent,
        EventType::LinkClicked,
        EventType::CampaignOpened,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::ContactCreated => "contact_created",
            EventType::InterestDetected => "interest_detected",
            EventType::CampaignSent => "campaign_sent",
            EventType::LinkClicked => "link_clicked",
            EventType::CampaignOpened => "campaign_opened",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

// ─── Event payloads ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactCreated {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Channel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterestDetected {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest_level: Option<InterestLevel>,
    /// Message fragment that triggered the classification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CampaignSent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipients: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkClicked {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CampaignOpened {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// Event metadata keyed by event type. Unrecognised kinds keep their raw
/// type name and metadata map.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    ContactCreated(ContactCreated),
    InterestDetected(InterestDetected),
    CampaignSent(CampaignSent),
    LinkClicked(LinkClicked),
    CampaignOpened(CampaignOpened),
    Unknown {
        event_type: String,
        metadata: Map<String, Value>,
    },
}

impl EventPayload {
    pub fn event_type(&self) -> Option<EventType> {
        match self {
            EventPayload::ContactCreated(_) => Some(EventType::ContactCreated),
            EventPayload::InterestDetected(_) => Some(EventType::InterestDetected),
            EventPayload::CampaignSent(_) => Some(EventType::CampaignSent),
            EventPayload::LinkClicked(_) => Some(EventType::LinkClicked),
            EventPayload::CampaignOpened(_) => Some(EventType::CampaignOpened),
            EventPayload::Unknown { .. } => None,
        }
    }

    /// Type name as it appears on the wire.
    pub fn type_name(&self) -> &str {
        match self {
            EventPayload::Unknown { event_type, .. } => event_type.as_str(),
            known => known.event_type().map(|t| t.as_str()).unwrap_or_default(),
        }
    }

    fn from_wire(event_type: String, metadata: Map<String, Value>) -> Result<Self, InsightsError> {
        let Some(kind) = EventType::parse(&event_type) else {
            return Ok(EventPayload::Unknown {
                event_type,
                metadata,
            });
        };
        let value = Value::Object(metadata);
        let payload = match kind {
            EventType::ContactCreated => EventPayload::ContactCreated(decode(kind, value)?),
            EventType::InterestDetected => EventPayload::InterestDetected(decode(kind, value)?),
            EventType::CampaignSent => EventPayload::CampaignSent(decode(kind, value)?),
            EventType::LinkClicked => EventPayload::LinkClicked(decode(kind, value)?),
            EventType::CampaignOpened => EventPayload::CampaignOpened(decode(kind, value)?),
        };
        Ok(payload)
    }

    fn into_wire(self) -> (String, Map<String, Value>) {
        let name = self.type_name().to_string();
        let value = match self {
            EventPayload::ContactCreated(p) => serde_json::to_value(p),
            EventPayload::InterestDetected(p) => serde_json::to_value(p),
            EventPayload::CampaignSent(p) => serde_json::to_value(p),
            EventPayload::LinkClicked(p) => serde_json::to_value(p),
            EventPayload::CampaignOpened(p) => serde_json::to_value(p),
            EventPayload::Unknown { metadata, .. } => return (name, metadata),
        };
        match value {
            Ok(Value::Object(map)) => (name, map),
            _ => (name, Map::new()),
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(kind: EventType, value: Value) -> Result<T, InsightsError> {
    serde_json::from_value(value).map_err(|e| {
        InsightsError::Validation(format!("invalid {} metadata: {}", kind.as_str(), e))
    })
}

/// A single activity event. Serialized flat, with `event_type` and
/// `metadata` next to the identity fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireEvent", into = "WireEvent")]
pub struct Event {
    pub id: Uuid,
    pub contact_id: Option<Uuid>,
    pub campaign_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(payload: EventPayload, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            contact_id: None,
            campaign_id: None,
            created_at,
            payload,
        }
    }

    pub fn with_contact(mut self, contact_id: Uuid) -> Self {
        self.contact_id = Some(contact_id);
        self
    }

    pub fn with_campaign(mut self, campaign_id: Uuid) -> Self {
        self.campaign_id = Some(campaign_id);
        self
    }

    pub fn event_type(&self) -> Option<EventType> {
        self.payload.event_type()
    }

    pub fn is(&self, kind: EventType) -> bool {
        self.event_type() == Some(kind)
    }
}

#[derive(Serialize, Deserialize)]
struct WireEvent {
    id: Uuid,
    event_type: String,
    #[serde(default)]
    contact_id: Option<Uuid>,
    #[serde(default)]
    campaign_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

impl TryFrom<WireEvent> for Event {
    type Error = InsightsError;

    fn try_from(wire: WireEvent) -> Result<Self, Self::Error> {
        let payload = EventPayload::from_wire(wire.event_type, wire.metadata.unwrap_or_default())?;
        Ok(Event {
            id: wire.id,
            contact_id: wire.contact_id,
            campaign_id: wire.campaign_id,
            created_at: wire.created_at,
            payload,
        })
    }
}

impl From<Event> for WireEvent {
    fn from(event: Event) -> Self {
        let (event_type, metadata) = event.payload.into_wire();
        WireEvent {
            id: event.id,
            event_type,
            contact_id: event.contact_id,
            campaign_id: event.campaign_id,
            created_at: event.created_at,
            metadata: Some(metadata),
        }
    }
}

/// Observed clicks and sends for one arm of an experiment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSummary {
    pub clicks: u64,
    pub sent: u64,
}

impl VariantSummary {
    pub fn new(clicks: u64, sent: u64) -> Self {
        Self { clicks, sent }
    }

    /// Rejects summaries with more clicks than sends.
    pub fn validate(&self) -> Result<(), InsightsError> {
        if self.clicks > self.sent {
            return Err(InsightsError::Validation(format!(
                "variant has {} clicks but only {} sends",
                self.clicks, self.sent
            )));
        }
        Ok(())
    }
}

impl From<&Campaign> for VariantSummary {
    fn from(campaign: &Campaign) -> Self {
        Self {
            clicks: campaign.click_count,
            sent: campaign.sent_count,
        }
    }
}

/// Read-only bundle of records handed over by the data store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub contacts: Vec<Contact>,
    #[serde(default)]
    pub campaigns: Vec<Campaign>,
    #[serde(default)]
    pub events: Vec<Event>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_known_event_decodes_typed_payload() {
        let raw = json!({
            "id": "6f1c2d1e-8a1b-4c3e-9f00-000000000001",
            "event_type": "link_clicked",
            "campaign_id": "6f1c2d1e-8a1b-4c3e-9f00-0000000000aa",
            "created_at": "2026-10-01T10:00:00Z",
            "metadata": { "url": "https://example.com/offer" }
        });
        let event: Event = serde_json::from_value(raw).unwrap();
        assert!(event.is(EventType::LinkClicked));
        assert!(event.contact_id.is_none());
        assert_eq!(
            event.payload,
            EventPayload::LinkClicked(LinkClicked {
                url: Some("https://example.com/offer".to_string())
            })
        );
    }

    #[test]
    fn test_unknown_event_keeps_metadata() {
        let raw = json!({
            "id": "6f1c2d1e-8a1b-4c3e-9f00-000000000002",
            "event_type": "story_reply",
            "created_at": "2026-10-01T10:00:00Z",
            "metadata": { "story_id": 42 }
        });
        let event: Event = serde_json::from_value(raw).unwrap();
        assert_eq!(event.event_type(), None);
        match &event.payload {
            EventPayload::Unknown {
                event_type,
                metadata,
            } => {
                assert_eq!(event_type, "story_reply");
                assert_eq!(metadata.get("story_id"), Some(&json!(42)));
            }
            other => panic!("expected unknown payload, got {:?}", other),
        }

        let back = serde_json::to_value(&event).unwrap();
        assert_eq!(back["event_type"], "story_reply");
        assert_eq!(back["metadata"]["story_id"], 42);
    }

    #[test]
    fn test_missing_metadata_defaults() {
        let raw = json!({
            "id": "6f1c2d1e-8a1b-4c3e-9f00-000000000003",
            "event_type": "campaign_opened",
            "created_at": "2026-10-01T10:00:00Z"
        });
        let event: Event = serde_json::from_value(raw).unwrap();
        assert_eq!(
            event.payload,
            EventPayload::CampaignOpened(CampaignOpened::default())
        );
    }

    #[test]
    fn test_malformed_metadata_rejected() {
        let raw = json!({
            "id": "6f1c2d1e-8a1b-4c3e-9f00-000000000004",
            "event_type": "campaign_sent",
            "created_at": "2026-10-01T10:00:00Z",
            "metadata": { "recipients": "lots" }
        });
        let err = serde_json::from_value::<Event>(raw).unwrap_err();
        assert!(err.to_string().contains("campaign_sent"));
    }

    #[test]
    fn test_event_serializes_flat() {
        let at = Utc.with_ymd_and_hms(2026, 10, 1, 8, 30, 0).unwrap();
        let contact = Uuid::new_v4();
        let event = Event::new(
            EventPayload::InterestDetected(InterestDetected {
                interest_level: Some(InterestLevel::Interested),
                message: None,
            }),
            at,
        )
        .with_contact(contact);

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event_type"], "interest_detected");
        assert_eq!(value["metadata"]["interest_level"], "interested");
        assert_eq!(value["contact_id"], json!(contact));

        let decoded: Event = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, event);
    }

    #[test]
    fn test_campaign_event_keeps_campaign_id() {
        let at = Utc.with_ymd_and_hms(2026, 10, 2, 9, 0, 0).unwrap();
        let campaign = Uuid::new_v4();
        let event = Event::new(
            EventPayload::CampaignSent(CampaignSent { recipients: Some(314) }),
            at,
        )
        .with_campaign(campaign);

        assert!(event.is(EventType::CampaignSent));
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["campaign_id"], json!(campaign));
        assert_eq!(value["metadata"]["recipients"], 314);

        let decoded: Event = serde_json::from_value(value).unwrap();
        assert_eq!(decoded.campaign_id, Some(campaign));
        assert_eq!(decoded, event);
    }

    #[test]
    fn test_variant_validation() {
        assert!(VariantSummary::new(10, 100).validate().is_ok());
        assert!(VariantSummary::new(0, 0).validate().is_ok());
        assert!(matches!(
            VariantSummary::new(101, 100).validate(),
            Err(InsightsError::Validation(_))
        ));
    }

    #[test]
    fn test_variant_from_campaign() {
        let campaign = Campaign {
            id: Uuid::new_v4(),
            name: "Spring promo".to_string(),
            status: CampaignStatus::Running,
            sent_count: 314,
            click_count: 132,
            created_at: Utc::now(),
        };
        assert_eq!(VariantSummary::from(&campaign), VariantSummary::new(132, 314));
        assert!(!campaign.has_excess_clicks());
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(serde_json::to_value(Channel::Instagram).unwrap(), "instagram");
        assert_eq!(
            serde_json::to_value(InterestLevel::NotInterested).unwrap(),
            "not_interested"
        );
        assert_eq!(serde_json::to_value(CampaignStatus::Running).unwrap(), "running");
        for kind in EventType::ALL {
            assert_eq!(EventType::parse(kind.as_str()), Some(kind));
        }
    }
}
