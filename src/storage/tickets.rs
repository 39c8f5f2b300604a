//! One-shot upload tickets.
//!
//! DESIGN
//! ======
//! A ticket pairs a fresh object id with a random token and an expiry. The
//! client receives both inside the upload URL and must present them on the
//! PUT. A ticket is consumed by its first successful redemption; expired
//! tickets are swept whenever a new one is issued.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use rand::Rng;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTicket {
    pub object_id: Uuid,
    pub token: String,
    pub expires_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketRejection {
    Unknown,
    Expired,
    TokenMismatch,
}

pub struct UploadTickets {
    ttl: Duration,
    inner: Mutex<HashMap<Uuid, UploadTicket>>,
}

impl UploadTickets {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, inner: Mutex::new(HashMap::new()) }
    }

    /// Issue a ticket for a new object id.
    pub fn issue(&self, now: Instant) -> UploadTicket {
        let ticket = UploadTicket { object_id: Uuid::new_v4(), token: random_token(), expires_at: now + self.ttl };
        let mut map = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        map.retain(|_, t| t.expires_at > now);
        map.insert(ticket.object_id, ticket.clone());
        ticket
    }

    /// Validate without consuming.
    ///
    /// # Errors
    ///
    /// Returns why the ticket cannot be used.
    pub fn check(&self, object_id: Uuid, token: &str, now: Instant) -> Result<(), TicketRejection> {
        let map = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let ticket = map.get(&object_id).ok_or(TicketRejection::Unknown)?;
        Self::verify(ticket, token, now)
    }

    /// Validate and consume, returning the consumed ticket.
    ///
    /// A wrong token leaves the ticket in place; an expired one is removed.
    ///
    /// # Errors
    ///
    /// Returns why the ticket cannot be used.
    pub fn redeem(&self, object_id: Uuid, token: &str, now: Instant) -> Result<UploadTicket, TicketRejection> {
        let mut map = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let ticket = map.get(&object_id).ok_or(TicketRejection::Unknown)?;
        match Self::verify(ticket, token, now) {
            Ok(()) => map.remove(&object_id).ok_or(TicketRejection::Unknown),
            Err(TicketRejection::Expired) => {
                map.remove(&object_id);
                Err(TicketRejection::Expired)
            }
            Err(other) => Err(other),
        }
    }

    /// Put a redeemed ticket back after the upload it guarded failed.
    pub fn restore(&self, ticket: UploadTicket) {
        let mut map = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        map.insert(ticket.object_id, ticket);
    }

    /// Outstanding tickets, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn verify(ticket: &UploadTicket, token: &str, now: Instant) -> Result<(), TicketRejection> {
        if now >= ticket.expires_at {
            return Err(TicketRejection::Expired);
        }
        if ticket.token != token {
            return Err(TicketRejection::TokenMismatch);
        }
        Ok(())
    }
}

/// 128 random bits as lowercase hex.
fn random_token() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
