//! Wire-level constants for the robot control protocol
//!
//! Every server-to-client message is ASCII text followed by the 2-byte
//! [`DELIMITER`]. Max-length constants include the trailing delimiter, so a
//! `receive(MAX_USERNAME)` call bounds the *total* bytes read for that
//! message, not just its content.

/// Marks the end of every protocol message: ASCII BEL (`0x07`) + BS (`0x08`).
pub const DELIMITER: [u8; 2] = [0x07, 0x08];

/// Number of distinct robot identities in [`crate::auth::KEYS`].
pub const KEY_COUNT: usize = 5;

// Client -> server maximum message lengths, delimiter included.
pub const MAX_USERNAME: usize = 20;
pub const MAX_ROBOT_ID: usize = 5;
pub const MAX_CLIENT_KEY: usize = 7;
pub const MAX_CLIENT_OK: usize = 12;
pub const MAX_RECHARGING: usize = 12;
pub const MAX_FULL_POWER: usize = 12;
pub const MAX_SECRET_MESSAGE: usize = 100;

/// `len("RECHARGING") + len(DELIMITER)` — the cap the recharge-aware reader
/// extends to when a short-capped read's buffer is a proper prefix of
/// `RECHARGING`, so the token isn't truncated before it can be recognized.
pub const MAX_RECHARGING_TOKEN: usize = RECHARGING.len() + DELIMITER.len();

pub const RECHARGING: &str = "RECHARGING";
pub const FULL_POWER: &str = "FULL POWER";

/// Recharge window timeout. Active only between receiving `RECHARGING` and
/// the expected `FULL POWER` reply.
pub const RECHARGE_TIMEOUT_SECS: u64 = 5;
/// Normal per-message read timeout.
pub const NORMAL_TIMEOUT_SECS: u64 = 1;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 3999;

/// Builds a server message by appending the delimiter, e.g. `framed("102 MOVE")`.
pub fn framed(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() + DELIMITER.len());
    out.extend_from_slice(text.as_bytes());
    out.extend_from_slice(&DELIMITER);
    out
}

pub const MSG_KEY_REQUEST: &str = "107 KEY REQUEST";
pub const MSG_KEY_OUT_OF_RANGE: &str = "303 KEY OUT OF RANGE";
pub const MSG_LOGIN_FAILED: &str = "300 LOGIN FAILED";
pub const MSG_OK: &str = "200 OK";
pub const MSG_MOVE: &str = "102 MOVE";
pub const MSG_TURN_LEFT: &str = "103 TURN LEFT";
pub const MSG_TURN_RIGHT: &str = "104 TURN RIGHT";
pub const MSG_GET_MESSAGE: &str = "105 GET MESSAGE";
pub const MSG_LOGOUT: &str = "106 LOGOUT";
pub const MSG_SYNTAX_ERROR: &str = "301 SYNTAX ERROR";
pub const MSG_LOGIC_ERROR: &str = "302 LOGIC ERROR";
