//! # Access Gate
//!
//! Role resolution and the explicit session context every engine call takes.
//!
//! ## Who May Do What
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Owner / Admin                     Seller                              │
//! │   ─────────────                     ──────                              │
//! │   any location                      assigned location only              │
//! │   may switch active location        fixed to assignment                 │
//! │   logout any time                   logout blocked while a shift        │
//! │                                     they opened is still OPEN           │
//! │   lands on Dashboard                lands on POS                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::{LocationId, Shift, UserProfile};

// =============================================================================
// Role
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Gallery owner or administrator.
    Owner,
    /// Shop staff confined to one location.
    Seller,
}

impl Role {
    /// Maps the identity provider's free-text role.
    ///
    /// Anything that is not recognisably an owner is a seller, so an
    /// unexpected value never grants extra rights.
    ///
    /// ```rust
    /// use nano_core::access::Role;
    ///
    /// assert_eq!(Role::parse_lenient(" Dueño "), Role::Owner);
    /// assert_eq!(Role::parse_lenient("vendedor"), Role::Seller);
    /// ```
    pub fn parse_lenient(raw: &str) -> Role {
        match raw.trim().to_lowercase().as_str() {
            "owner" | "admin" | "dueño" | "dueno" => Role::Owner,
            _ => Role::Seller,
        }
    }

    #[inline]
    pub fn is_owner(&self) -> bool {
        matches!(self, Role::Owner)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Seller => "seller",
        }
    }
}

/// Screen a user is sent to after login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Landing {
    Dashboard,
    Pos,
}

// =============================================================================
// Session Context
// =============================================================================

/// The acting user, resolved once per session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub user_id: String,
    pub display_name: String,
    pub role: Role,
    /// Location the session currently acts on.
    pub active_location: LocationId,
}

impl SessionContext {
    /// Resolves the session from a profile.
    ///
    /// Sellers act on their assigned location; owners start on their
    /// assignment if they have one, otherwise on `default_location`.
    ///
    /// ## Errors
    /// `PermissionDenied` for a seller profile with no assigned location.
    pub fn establish(profile: &UserProfile, default_location: LocationId) -> CoreResult<Self> {
        let active_location = match (profile.role, profile.assigned_location_id) {
            (Role::Seller, Some(location)) => location,
            (Role::Seller, None) => {
                return Err(CoreError::denied(format!(
                    "seller {} has no assigned location",
                    profile.id
                )))
            }
            (Role::Owner, assigned) => assigned.unwrap_or(default_location),
        };

        Ok(SessionContext {
            user_id: profile.id.clone(),
            display_name: profile.display_name.clone(),
            role: profile.role,
            active_location,
        })
    }

    #[inline]
    pub fn is_owner(&self) -> bool {
        self.role.is_owner()
    }

    /// Moves an owner's session to another shop.
    pub fn switch_location(&mut self, location_id: LocationId) -> CoreResult<()> {
        if !self.is_owner() {
            return Err(CoreError::denied("only an owner can switch location"));
        }
        self.active_location = location_id;
        Ok(())
    }

    /// Checks the session may act on `location_id`.
    pub fn authorize(&self, location_id: LocationId) -> CoreResult<()> {
        if self.active_location != location_id {
            return Err(CoreError::denied(format!(
                "session is active on location {}, not {}",
                self.active_location, location_id
            )));
        }
        Ok(())
    }

    /// Owner-only gate (dashboard, reports across shops).
    pub fn require_owner(&self) -> CoreResult<()> {
        if !self.is_owner() {
            return Err(CoreError::denied("owner access required"));
        }
        Ok(())
    }

    pub fn landing(&self) -> Landing {
        match self.role {
            Role::Owner => Landing::Dashboard,
            Role::Seller => Landing::Pos,
        }
    }

    /// Decides whether the session may end given the location's open shift.
    pub fn check_logout(&self, open_shift: Option<&Shift>) -> CoreResult<()> {
        if self.is_owner() {
            return Ok(());
        }
        match open_shift {
            Some(shift)
                if shift.is_open()
                    && shift.location_id == self.active_location
                    && shift.opened_by == self.user_id =>
            {
                Err(CoreError::denied("close or relay the till first"))
            }
            _ => Ok(()),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ShiftStatus;
    use chrono::Utc;

    fn profile(role: Role, location: Option<LocationId>) -> UserProfile {
        UserProfile {
            id: "u-1".to_string(),
            display_name: "Ana".to_string(),
            role,
            assigned_location_id: location,
        }
    }

    fn open_shift(opened_by: &str, location_id: LocationId) -> Shift {
        Shift {
            id: "s-1".to_string(),
            location_id,
            opened_by: opened_by.to_string(),
            opening_balance_cents: 0,
            expected_cash_cents: 0,
            status: ShiftStatus::Open,
            declared_cash_cents: None,
            expected_total_cents: None,
            variance_cents: None,
            opened_at: Utc::now(),
            closed_at: None,
        }
    }

    #[test]
    fn test_role_parse_lenient() {
        assert_eq!(Role::parse_lenient("owner"), Role::Owner);
        assert_eq!(Role::parse_lenient("ADMIN"), Role::Owner);
        assert_eq!(Role::parse_lenient("dueño"), Role::Owner);
        assert_eq!(Role::parse_lenient("seller"), Role::Seller);
        assert_eq!(Role::parse_lenient(""), Role::Seller);
    }

    #[test]
    fn test_seller_session_uses_assignment() {
        let session = SessionContext::establish(&profile(Role::Seller, Some(3)), 1).unwrap();
        assert_eq!(session.active_location, 3);
        assert_eq!(session.landing(), Landing::Pos);
        assert!(session.authorize(3).is_ok());
        assert!(session.authorize(1).is_err());
    }

    #[test]
    fn test_seller_without_assignment_rejected() {
        let err = SessionContext::establish(&profile(Role::Seller, None), 1).unwrap_err();
        assert!(matches!(err, CoreError::PermissionDenied { .. }));
    }

    #[test]
    fn test_owner_switches_location() {
        let mut session = SessionContext::establish(&profile(Role::Owner, None), 1).unwrap();
        assert_eq!(session.active_location, 1);
        assert_eq!(session.landing(), Landing::Dashboard);

        session.switch_location(4).unwrap();
        assert!(session.authorize(4).is_ok());
        assert!(session.require_owner().is_ok());
    }

    #[test]
    fn test_seller_cannot_switch_location() {
        let mut session = SessionContext::establish(&profile(Role::Seller, Some(2)), 1).unwrap();
        assert!(session.switch_location(1).is_err());
        assert_eq!(session.active_location, 2);
        assert!(session.require_owner().is_err());
    }

    #[test]
    fn test_logout_rules() {
        let seller = SessionContext::establish(&profile(Role::Seller, Some(2)), 1).unwrap();
        assert!(seller.check_logout(None).is_ok());
        assert!(seller.check_logout(Some(&open_shift("u-1", 2))).is_err());
        // Someone else's shift does not pin this seller
        assert!(seller.check_logout(Some(&open_shift("u-9", 2))).is_ok());

        let owner = SessionContext::establish(&profile(Role::Owner, Some(2)), 1).unwrap();
        assert!(owner.check_logout(Some(&open_shift("u-1", 2))).is_ok());
    }
}
