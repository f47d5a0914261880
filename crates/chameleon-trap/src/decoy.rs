//! The fixed decoy payload served on every stale-route hit.
//!
//! The payload is intentionally high-privilege bait: it claims root
//! access and unlimited permissions so automated tooling flags it as a
//! jackpot and keeps the attacker engaged. It is byte-stable across
//! cycles and across clients; nothing in it depends on the request.
//!
//! The embedded marker in `account_flag` identifies trap responses out
//! of band (demo tooling and the dashboard look for it). It is never
//! explained to the caller, who sees only a successful-looking body.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Marker embedded in every decoy response.
///
/// Only meaningful to our own tooling; to the caller it reads like an
/// internal account flag.
pub const TRAP_MARKER: &str = "TRAP_DOOR_ACTIVATED_IP_LOGGED";

/// Fabricated user record inside the decoy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoyUserData {
    /// Bait username.
    pub username: String,
    /// Bait permission level.
    pub permissions: String,
    /// Carries the trap marker.
    pub account_flag: String,
}

/// The decoy body returned for any request to an unmapped path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoyPayload {
    /// Bait status line.
    pub status: String,
    /// Fabricated user/permission fields.
    pub user_data: DecoyUserData,
    /// Bait narrative for the attacker's console.
    pub system_message: String,
}

impl DecoyPayload {
    /// The one and only decoy. Identical on every trap trigger.
    #[must_use]
    pub fn bait() -> Self {
        Self {
            status: "CRITICAL_SUCCESS".to_string(),
            user_data: DecoyUserData {
                username: "admin_root".to_string(),
                permissions: "UNLIMITED".to_string(),
                account_flag: TRAP_MARKER.to_string(),
            },
            system_message: "Root access granted. Downloading database...".to_string(),
        }
    }
}

/// Checks whether a JSON body originated from the trap.
///
/// Out-of-band detection only: the demo attacker and the dashboard use
/// this to recognize a deception response. The gateway never exposes
/// the check to callers.
#[must_use]
pub fn is_trap_response(body: &Value) -> bool {
    body.get("user_data")
        .and_then(|u| u.get("account_flag"))
        .and_then(Value::as_str)
        == Some(TRAP_MARKER)
}
