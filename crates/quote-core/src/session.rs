//! # Session Module
//!
//! Two-role visibility control with a local PIN and idle demotion.
//!
//! ## Role Transitions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │              elevate(pin) ─ first use: hash stored as reference         │
//! │              ┌──────────── later: hash must equal reference ──┐         │
//! │              │                                                ▼         │
//! │        ┌──────────┐                                     ┌──────────┐    │
//! │        │  Staff   │                                     │  Owner   │    │
//! │        └──────────┘                                     └──────────┘    │
//! │              ▲                                                │         │
//! │              └──── logout() ─── or ─── demote_if_idle(now) ───┘         │
//! │                                        (idle > 10 min)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! This module only holds state and compares hashes. Storing the reference
//! hash and running the poll timer are the caller's job.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use ts_rs::TS;

use crate::error::AuthError;
use crate::validation::validate_pin;
use crate::IDLE_LIMIT_SECS;

// =============================================================================
// Role
// =============================================================================

/// Session role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Role {
    /// Standard role: sells, quotes, prints.
    #[default]
    Staff,
    /// Elevated role: sees costs and profit, may clear history.
    Owner,
}

impl Role {
    /// Whether this role has the capability.
    pub fn can(&self, capability: Capability) -> bool {
        match capability {
            Capability::ViewCost
            | Capability::EditCost
            | Capability::ViewProfit
            | Capability::ClearHistory => *self == Role::Owner,
        }
    }

    /// Whether this is the elevated role.
    #[inline]
    pub fn is_elevated(&self) -> bool {
        *self == Role::Owner
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Staff => write!(f, "staff"),
            Role::Owner => write!(f, "owner"),
        }
    }
}

/// Owner-only actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ViewCost,
    EditCost,
    ViewProfit,
    ClearHistory,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::ViewCost => write!(f, "view cost prices"),
            Capability::EditCost => write!(f, "edit cost prices"),
            Capability::ViewProfit => write!(f, "view profit"),
            Capability::ClearHistory => write!(f, "clear the order history"),
        }
    }
}

// =============================================================================
// PIN hashing
// =============================================================================

/// SHA-256 of the PIN as lowercase hex.
pub fn hash_pin(pin: &str) -> String {
    hex::encode(Sha256::digest(pin.as_bytes()))
}

/// Result of a successful elevation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinOutcome {
    /// No reference existed; this hash is the new reference and must be stored.
    Enrolled(String),
    /// Matched the stored reference.
    Verified,
}

// =============================================================================
// Session Gate
// =============================================================================

/// Role plus last-activity bookkeeping for one session.
#[derive(Debug, Clone)]
pub struct SessionGate {
    role: Role,
    last_activity: DateTime<Utc>,
    idle_limit: Duration,
}

impl SessionGate {
    /// A staff session with the default 10-minute idle limit.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self::with_idle_limit(now, Duration::seconds(IDLE_LIMIT_SECS as i64))
    }

    /// A staff session with a custom idle limit.
    pub fn with_idle_limit(now: DateTime<Utc>, idle_limit: Duration) -> Self {
        SessionGate {
            role: Role::Staff,
            last_activity: now,
            idle_limit,
        }
    }

    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    #[inline]
    pub fn is_elevated(&self) -> bool {
        self.role.is_elevated()
    }

    #[inline]
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    #[inline]
    pub fn idle_limit(&self) -> Duration {
        self.idle_limit
    }

    /// Records operator input, restarting the idle clock.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity = now;
    }

    /// Tries to switch to the owner role.
    ///
    /// ## Flow
    /// ```text
    /// pin ──► validate (4-6 digits) ──✗──► InvalidPinFormat
    ///               │
    ///               ▼
    ///         hash_pin(pin)
    ///               │
    ///   stored None ├──────────► Owner, Enrolled(hash)
    ///   stored == h ├──────────► Owner, Verified
    ///   stored != h └──────────► PinMismatch (role unchanged)
    /// ```
    pub fn elevate(
        &mut self,
        pin: &str,
        stored_hash: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<PinOutcome, AuthError> {
        let pin = validate_pin(pin)?;
        let hash = hash_pin(pin);

        let outcome = match stored_hash {
            None => PinOutcome::Enrolled(hash),
            Some(reference) if reference == hash => PinOutcome::Verified,
            Some(_) => return Err(AuthError::PinMismatch),
        };

        self.role = Role::Owner;
        self.last_activity = now;
        Ok(outcome)
    }

    /// Back to staff.
    pub fn logout(&mut self) {
        self.role = Role::Staff;
    }

    /// Demotes an owner idle for longer than the limit.
    ///
    /// ## Returns
    /// `true` if the role changed.
    pub fn demote_if_idle(&mut self, now: DateTime<Utc>) -> bool {
        if self.role == Role::Owner && now - self.last_activity > self.idle_limit {
            self.role = Role::Staff;
            return true;
        }
        false
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-01T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_hash_pin_is_sha256_hex() {
        assert_eq!(
            hash_pin("1234"),
            "03ac674216f3e15c761ee1a5e255f067953623c8b388b4459e13f978d7c846f4"
        );
    }

    #[test]
    fn test_first_pin_enrolls_and_elevates() {
        let mut gate = SessionGate::new(t0());
        let outcome = gate.elevate("1234", None, t0()).unwrap();
        assert_eq!(outcome, PinOutcome::Enrolled(hash_pin("1234")));
        assert_eq!(gate.role(), Role::Owner);
    }

    #[test]
    fn test_wrong_pin_in_fresh_session_stays_staff() {
        let reference = hash_pin("1234");
        let mut gate = SessionGate::new(t0());
        assert_eq!(
            gate.elevate("9999", Some(&reference), t0()),
            Err(AuthError::PinMismatch)
        );
        assert_eq!(gate.role(), Role::Staff);

        assert_eq!(
            gate.elevate("1234", Some(&reference), t0()),
            Ok(PinOutcome::Verified)
        );
        assert!(gate.is_elevated());
    }

    #[test]
    fn test_malformed_pin_rejected() {
        let mut gate = SessionGate::new(t0());
        for pin in ["123", "1234567", "12a4", ""] {
            assert_eq!(gate.elevate(pin, None, t0()), Err(AuthError::InvalidPinFormat));
        }
        assert_eq!(gate.role(), Role::Staff);
    }

    #[test]
    fn test_idle_demotion() {
        let mut gate = SessionGate::new(t0());
        gate.elevate("1234", None, t0()).unwrap();

        assert!(!gate.demote_if_idle(t0() + Duration::minutes(10)));
        assert!(gate.is_elevated());

        assert!(gate.demote_if_idle(t0() + Duration::minutes(10) + Duration::seconds(1)));
        assert_eq!(gate.role(), Role::Staff);
    }

    #[test]
    fn test_activity_resets_idle_clock() {
        let mut gate = SessionGate::new(t0());
        gate.elevate("1234", None, t0()).unwrap();

        gate.touch(t0() + Duration::minutes(9));
        assert!(!gate.demote_if_idle(t0() + Duration::minutes(15)));
        assert!(gate.is_elevated());
    }

    #[test]
    fn test_staff_is_never_demoted() {
        let mut gate = SessionGate::new(t0());
        assert!(!gate.demote_if_idle(t0() + Duration::hours(5)));
    }

    #[test]
    fn test_logout() {
        let mut gate = SessionGate::new(t0());
        gate.elevate("123456", None, t0()).unwrap();
        gate.logout();
        assert_eq!(gate.role(), Role::Staff);
    }

    #[test]
    fn test_capabilities() {
        assert!(!Role::Staff.can(Capability::EditCost));
        assert!(!Role::Staff.can(Capability::ClearHistory));
        assert!(Role::Owner.can(Capability::ViewProfit));
        assert!(Role::Owner.can(Capability::ViewCost));
    }
}
