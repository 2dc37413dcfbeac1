//! Verification and dispatch of Stripe webhook deliveries.
//!
//! Stripe signs each delivery with `Stripe-Signature: t=<unix>,v1=<hex>`,
//! where `v1` is the HMAC-SHA256 of `"<t>.<raw body>"` keyed with the
//! endpoint's signing secret. Several `v1` entries may be present while a
//! secret is being rolled; any match is accepted.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Deliveries signed longer ago than this are rejected.
pub const TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("No stripe-signature header value was provided.")]
    MissingHeader,

    #[error("Webhook signing secret is not configured.")]
    MissingSecret,

    #[error("Unable to extract timestamp and signatures from header")]
    MalformedHeader,

    #[error("No signatures found with expected scheme")]
    NoSignatures,

    #[error("No signatures found matching the expected signature for payload")]
    SignatureMismatch,

    #[error("Timestamp outside the tolerance zone")]
    TimestampOutsideTolerance,

    #[error("Invalid event payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

#[derive(Debug, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    pub signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        if header.trim().is_empty() {
            return Err(WebhookError::MissingHeader);
        }

        let mut timestamp = None;
        let mut signatures = Vec::new();
        for part in header.split(',') {
            let (key, value) = part
                .split_once('=')
                .ok_or(WebhookError::MalformedHeader)?;
            match key.trim() {
                "t" => {
                    timestamp = Some(
                        value
                            .trim()
                            .parse::<i64>()
                            .map_err(|_| WebhookError::MalformedHeader)?,
                    )
                }
                // Undecodable entries can never match, so they are skipped.
                "v1" => {
                    if let Ok(signature) = hex::decode(value.trim()) {
                        signatures.push(signature);
                    }
                }
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or(WebhookError::MalformedHeader)?;
        if signatures.is_empty() {
            return Err(WebhookError::NoSignatures);
        }
        Ok(Self {
            timestamp,
            signatures,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub livemode: bool,
    pub data: EventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: Value,
}

/// Verifies `payload` against the signature header and parses the event.
pub fn construct_event(
    payload: &[u8],
    header: &str,
    secret: &str,
    now: i64,
) -> Result<Event, WebhookError> {
    let header = SignatureHeader::parse(header)?;

    let expected = sign(payload, header.timestamp, secret);
    let matched = header
        .signatures
        .iter()
        .any(|candidate| expected.clone().verify_slice(candidate).is_ok());
    if !matched {
        return Err(WebhookError::SignatureMismatch);
    }

    if now - header.timestamp > TOLERANCE_SECS {
        return Err(WebhookError::TimestampOutsideTolerance);
    }

    Ok(serde_json::from_slice(payload)?)
}

fn sign(payload: &[u8], timestamp: i64, secret: &str) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    mac
}

/// Hex signature Stripe would send for `payload` at `timestamp`.
pub fn compute_signature(payload: &[u8], timestamp: i64, secret: &str) -> String {
    hex::encode(sign(payload, timestamp, secret).finalize().into_bytes())
}

#[derive(Debug, PartialEq, Eq)]
pub enum Dispatch {
    CheckoutCompleted { session_id: String },
    Unhandled { event_type: String },
}

/// Classifies a verified event. Completed checkouts carry the session id;
/// the demo keeps no order state.
pub fn dispatch(event: &Event) -> Dispatch {
    match event.event_type.as_str() {
        "checkout.session.completed" => Dispatch::CheckoutCompleted {
            session_id: event
                .data
                .object
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        },
        other => Dispatch::Unhandled {
            event_type: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";
    const NOW: i64 = 1_700_000_000;
    const PAYLOAD: &[u8] = br#"{"id":"evt_1","type":"checkout.session.completed","livemode":false,"data":{"object":{"id":"cs_test_123","object":"checkout.session"}}}"#;

    fn header_for(payload: &[u8], timestamp: i64, secret: &str) -> String {
        format!(
            "t={},v1={}",
            timestamp,
            compute_signature(payload, timestamp, secret)
        )
    }

    #[test]
    fn valid_signature_yields_event() {
        let header = header_for(PAYLOAD, NOW, SECRET);
        let event = construct_event(PAYLOAD, &header, SECRET, NOW).unwrap();
        assert_eq!(event.id, "evt_1");
        assert_eq!(event.event_type, "checkout.session.completed");
        assert!(!event.livemode);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let header = header_for(PAYLOAD, NOW, "whsec_other");
        let err = construct_event(PAYLOAD, &header, SECRET, NOW).unwrap_err();
        assert!(matches!(err, WebhookError::SignatureMismatch));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let header = header_for(PAYLOAD, NOW, SECRET);
        let tampered = br#"{"id":"evt_1","type":"checkout.session.completed","data":{"object":{}}}"#;
        let err = construct_event(tampered, &header, SECRET, NOW).unwrap_err();
        assert!(matches!(err, WebhookError::SignatureMismatch));
    }

    #[test]
    fn stale_timestamp_is_rejected() {
        let signed_at = NOW - TOLERANCE_SECS - 1;
        let header = header_for(PAYLOAD, signed_at, SECRET);
        let err = construct_event(PAYLOAD, &header, SECRET, NOW).unwrap_err();
        assert!(matches!(err, WebhookError::TimestampOutsideTolerance));
    }

    #[test]
    fn future_timestamp_within_clock_skew_is_accepted() {
        let signed_at = NOW + TOLERANCE_SECS + 60;
        let header = header_for(PAYLOAD, signed_at, SECRET);
        assert!(construct_event(PAYLOAD, &header, SECRET, NOW).is_ok());
    }

    #[test]
    fn any_matching_v1_signature_is_accepted() {
        let good = compute_signature(PAYLOAD, NOW, SECRET);
        let header = format!("t={NOW},v1={},v1={good},v0=deadbeef", "00".repeat(32));
        assert!(construct_event(PAYLOAD, &header, SECRET, NOW).is_ok());
    }

    #[test]
    fn header_errors_are_distinguished() {
        assert!(matches!(
            SignatureHeader::parse(""),
            Err(WebhookError::MissingHeader)
        ));
        assert!(matches!(
            SignatureHeader::parse("garbage"),
            Err(WebhookError::MalformedHeader)
        ));
        assert!(matches!(
            SignatureHeader::parse("v1=abcd"),
            Err(WebhookError::MalformedHeader)
        ));
        assert!(matches!(
            SignatureHeader::parse("t=123"),
            Err(WebhookError::NoSignatures)
        ));
        assert!(matches!(
            SignatureHeader::parse("t=123,v1=not-hex"),
            Err(WebhookError::NoSignatures)
        ));
    }

    #[test]
    fn signed_non_event_body_is_a_payload_error() {
        let body = b"[1,2,3]";
        let header = header_for(body, NOW, SECRET);
        let err = construct_event(body, &header, SECRET, NOW).unwrap_err();
        assert!(matches!(err, WebhookError::InvalidPayload(_)));
    }

    #[test]
    fn dispatch_reports_completed_checkout() {
        let event: Event = serde_json::from_slice(PAYLOAD).unwrap();
        assert_eq!(
            dispatch(&event),
            Dispatch::CheckoutCompleted {
                session_id: "cs_test_123".to_string()
            }
        );
    }

    #[test]
    fn dispatch_passes_over_other_events() {
        let event: Event = serde_json::from_value(serde_json::json!({
            "id": "evt_2",
            "type": "payment_intent.succeeded",
            "data": {"object": {"id": "pi_1"}},
        }))
        .unwrap();
        assert_eq!(
            dispatch(&event),
            Dispatch::Unhandled {
                event_type: "payment_intent.succeeded".to_string()
            }
        );
    }
}
