//! Domain types for the Matchday live event integrity core.
//!
//! This module contains the value objects and entities shared by the gate
//! (ticket validation) and live match sides of the system: ticket orders,
//! scan records, and live match state snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for a purchased ticket order.
///
/// This is the value encoded in the QR/barcode printed on the ticket and
/// typed in during manual entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketOrderId(Uuid);

impl TicketOrderId {
    /// Creates a new random `TicketOrderId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `TicketOrderId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Parse a scanned or typed code into a ticket order id.
    ///
    /// Surrounding whitespace is tolerated; anything that is not a UUID
    /// yields `None` (the gate treats it the same as an unknown ticket).
    #[must_use]
    pub fn parse(code: &str) -> Option<Self> {
        Uuid::parse_str(code.trim()).ok().map(Self)
    }
}

impl Default for TicketOrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TicketOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchId(Uuid);

impl MatchId {
    /// Creates a new random `MatchId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `MatchId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for MatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a gate operator (steward device/account).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperatorId(Uuid);

impl OperatorId {
    /// Creates a new random `OperatorId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `OperatorId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OperatorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OperatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Ticket orders
// ============================================================================

/// Payment lifecycle status of a ticket order.
///
/// Only `Completed` orders are redeemable at the gate; the store-level
/// lookup filters on this status so unpaid orders are indistinguishable
/// from unknown ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// Payment initiated but not confirmed
    Pending,
    /// Payment confirmed by the gateway
    Completed,
    /// Payment rejected or abandoned
    Failed,
}

impl PaymentStatus {
    /// Database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Parse a status from its database string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The match a ticket type admits to, as carried on the ticket order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchInfo {
    /// Match identifier
    pub match_id: MatchId,
    /// Home team name
    pub home_team: String,
    /// Away team name
    pub away_team: String,
    /// Scheduled kickoff time
    pub kickoff: DateTime<Utc>,
}

impl MatchInfo {
    /// Human-readable fixture description ("Home vs Away").
    #[must_use]
    pub fn description(&self) -> String {
        format!("{} vs {}", self.home_team, self.away_team)
    }
}

/// The ticket type a purchase refers to.
///
/// `match_info` is `None` for non-match entitlements (season passes,
/// museum tours); those never expire at the gate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketType {
    /// Ticket type name (e.g. "Main Stand Adult")
    pub name: String,
    /// The match this ticket admits to, if any
    pub match_info: Option<MatchInfo>,
}

/// A purchased ticket entitlement.
///
/// Created by the shop once payment completes and immutable thereafter;
/// the gate only ever reads it. Redemption state lives exclusively in the
/// scan ledger, never on the order itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketOrder {
    /// Unique order identifier (the scanned code)
    pub id: TicketOrderId,
    /// What was purchased
    pub ticket_type: TicketType,
    /// Number of admissions covered by this order
    pub quantity: u32,
    /// Payment lifecycle status
    pub payment_status: PaymentStatus,
    /// Customer display name, shown to the operator on acceptance
    pub customer_name: String,
}

// ============================================================================
// Scan ledger
// ============================================================================

/// Durable proof that a ticket order has been redeemed at the gate.
///
/// At most one record may ever exist per ticket order; the backing store
/// enforces this with a uniqueness constraint on `ticket_order_id`, and
/// that constraint is the sole "scanned at most once" enforcement point.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRecord {
    /// The redeemed ticket order
    pub ticket_order_id: TicketOrderId,
    /// When the scan was accepted
    pub scanned_at: DateTime<Utc>,
    /// The operator who performed the scan
    pub operator_id: OperatorId,
}

/// Operator-facing summary returned on a successful scan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketSummary {
    /// Customer display name
    pub customer_name: String,
    /// Ticket type name
    pub ticket_type: String,
    /// Fixture description, empty for non-match tickets
    pub match_description: Option<String>,
    /// Admissions covered
    pub quantity: u32,
    /// When the scan was recorded
    pub scanned_at: DateTime<Utc>,
}

impl TicketSummary {
    /// Build a summary from an order and the moment its scan was recorded.
    #[must_use]
    pub fn from_order(order: &TicketOrder, scanned_at: DateTime<Utc>) -> Self {
        Self {
            customer_name: order.customer_name.clone(),
            ticket_type: order.ticket_type.name.clone(),
            match_description: order
                .ticket_type
                .match_info
                .as_ref()
                .map(MatchInfo::description),
            quantity: order.quantity,
            scanned_at,
        }
    }
}

// ============================================================================
// Live match state
// ============================================================================

/// Lifecycle status of a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    /// Not yet kicked off
    Scheduled,
    /// In play
    Live,
    /// Half-time interval
    HalfTime,
    /// Full time reached
    Finished,
    /// Postponed before kickoff
    Postponed,
    /// Cancelled outright
    Cancelled,
}

impl MatchStatus {
    /// Whether the match is currently underway (in play or at the interval).
    #[must_use]
    pub const fn is_underway(&self) -> bool {
        matches!(self, Self::Live | Self::HalfTime)
    }

    /// Database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Live => "live",
            Self::HalfTime => "half_time",
            Self::Finished => "finished",
            Self::Postponed => "postponed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parse a status from its database string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(Self::Scheduled),
            "live" => Some(Self::Live),
            "half_time" => Some(Self::HalfTime),
            "finished" => Some(Self::Finished),
            "postponed" => Some(Self::Postponed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The live, mutable representation of a match's score, clock, and status.
///
/// Mutated exclusively by the match clock publisher (minute advancement)
/// and admin actions (score/status changes). Subscribers treat every
/// received value as an authoritative full snapshot and never derive the
/// minute or score incrementally on their own.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchState {
    /// Match identifier
    pub id: MatchId,
    /// Lifecycle status
    pub status: MatchStatus,
    /// Home team goals
    pub home_score: u32,
    /// Away team goals
    pub away_score: u32,
    /// Elapsed minute of play
    pub current_minute: u32,
    /// Added minutes past the regular half boundary
    pub extra_time: u32,
    /// Whether the match clock is advancing
    pub timer_running: bool,
    /// Whether the clock pauses at the 45' boundary for the interval
    pub half_time_break: bool,
}

impl MatchState {
    /// A freshly scheduled match with the clock at zero.
    #[must_use]
    pub const fn scheduled(id: MatchId) -> Self {
        Self {
            id,
            status: MatchStatus::Scheduled,
            home_score: 0,
            away_score: 0,
            current_minute: 0,
            extra_time: 0,
            timer_running: false,
            half_time_break: true,
        }
    }

    /// Display clock, e.g. `45+2'`.
    #[must_use]
    pub fn clock_label(&self) -> String {
        if self.extra_time > 0 {
            format!("{}+{}'", self.current_minute, self.extra_time)
        } else {
            format!("{}'", self.current_minute)
        }
    }
}

/// A full-state match change event as carried on the feed.
///
/// Always a complete snapshot: the merge on the subscriber side is a
/// replace-by-id, which keeps redelivery and reordering harmless.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchUpdate {
    /// The authoritative snapshot
    pub state: MatchState,
    /// When the publisher emitted this snapshot
    pub emitted_at: DateTime<Utc>,
}

impl MatchUpdate {
    /// Create an update for a snapshot emitted now (per the caller's clock).
    #[must_use]
    pub const fn new(state: MatchState, emitted_at: DateTime<Utc>) -> Self {
        Self { state, emitted_at }
    }
}
