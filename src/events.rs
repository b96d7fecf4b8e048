//! Event payloads delivered to registered hooks.
//!
//! These are the broker-side views handed to hook callbacks. Everything is
//! cheap to clone: identifiers are `Arc<str>` and payloads are `Bytes`.

use crate::types::QoS;
use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::SystemTime;

/// TLS client certificate presented during connection establishment.
#[derive(Debug, Clone)]
pub struct SslClientCertificate {
    pub common_name: Arc<str>,
    /// Hex-encoded SHA-256 fingerprint of the DER certificate.
    pub fingerprint: Arc<str>,
    pub not_before: SystemTime,
    pub not_after: SystemTime,
}

impl SslClientCertificate {
    /// Returns `true` if `at` falls within the certificate's validity window.
    #[must_use]
    pub fn is_valid_at(&self, at: SystemTime) -> bool {
        at >= self.not_before && at <= self.not_after
    }
}

/// Connection-scoped information about the client that triggered an event.
#[derive(Debug, Clone)]
pub struct ClientData {
    pub client_id: Arc<str>,
    pub username: Option<Arc<str>>,
    pub authenticated: bool,
    pub peer_addr: Option<SocketAddr>,
    pub certificate: Option<SslClientCertificate>,
}

impl ClientData {
    #[must_use]
    pub fn new(client_id: impl Into<Arc<str>>) -> Self {
        Self {
            client_id: client_id.into(),
            username: None,
            authenticated: false,
            peer_addr: None,
            certificate: None,
        }
    }

    #[must_use]
    pub fn with_username(mut self, username: impl Into<Arc<str>>) -> Self {
        self.username = Some(username.into());
        self
    }

    #[must_use]
    pub fn with_certificate(mut self, certificate: SslClientCertificate) -> Self {
        self.certificate = Some(certificate);
        self
    }

    #[must_use]
    pub fn authenticated(mut self) -> Self {
        self.authenticated = true;
        self
    }
}

/// Will message announced in a CONNECT.
#[derive(Debug, Clone)]
pub struct WillMessage {
    pub topic: Arc<str>,
    pub payload: Bytes,
    pub qos: QoS,
    pub retain: bool,
}

/// Fired when a client's CONNECT has been accepted.
#[derive(Debug, Clone)]
pub struct ConnectEvent {
    pub client_id: Arc<str>,
    pub clean_start: bool,
    pub keep_alive_secs: u16,
    pub will: Option<WillMessage>,
}

/// Fired when the broker receives a PUBLISH from a client.
#[derive(Debug, Clone)]
pub struct PublishEvent {
    pub topic: Arc<str>,
    pub payload: Bytes,
    pub qos: QoS,
    pub retain: bool,
    /// Absent for QoS 0 publishes.
    pub packet_id: Option<u16>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_certificate_validity_window() {
        let now = SystemTime::now();
        let cert = SslClientCertificate {
            common_name: "device-01".into(),
            fingerprint: "ab".repeat(32).into(),
            not_before: now - Duration::from_secs(3600),
            not_after: now + Duration::from_secs(3600),
        };

        assert!(cert.is_valid_at(now));
        assert!(!cert.is_valid_at(now - Duration::from_secs(7200)));
        assert!(!cert.is_valid_at(now + Duration::from_secs(7200)));
    }

    #[test]
    fn test_client_data_builder() {
        let now = SystemTime::now();
        let client = ClientData::new("sensor-7")
            .with_username("telemetry")
            .with_certificate(SslClientCertificate {
                common_name: "sensor-7".into(),
                fingerprint: "00".repeat(32).into(),
                not_before: now,
                not_after: now + Duration::from_secs(60),
            })
            .authenticated();

        assert_eq!(&*client.client_id, "sensor-7");
        assert_eq!(client.username.as_deref(), Some("telemetry"));
        assert!(client.authenticated);
        assert!(client.certificate.is_some());
        assert!(client.peer_addr.is_none());
    }
}
