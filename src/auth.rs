//! Mutual-authentication handshake
//!
//! A robot identifies itself with a username and a `robot_id`. The server
//! derives a challenge from a hash of the username and the robot's server
//! key; the robot must answer with a confirmation derived from the same
//! hash and its own client key. Both keys come from the fixed [`KEYS`]
//! table — there is no dynamic key provisioning.

use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::{AuthFailureKind, SessionError};
use crate::protocol::{
    self, MAX_CLIENT_KEY, MAX_ROBOT_ID, MAX_USERNAME, MSG_KEY_OUT_OF_RANGE, MSG_KEY_REQUEST,
    MSG_LOGIN_FAILED, MSG_OK,
};
use crate::transport::recharge::RechargeAwareReader;

/// A robot identity's pair of keys, both modulo 65536.
#[derive(Debug, Clone, Copy)]
pub struct KeyPair {
    pub server: u32,
    pub client: u32,
}

const fn kp(server: u32, client: u32) -> KeyPair {
    KeyPair { server, client }
}

/// The fixed, read-only key table, indexed by `robot_id`.
pub const KEYS: [KeyPair; protocol::KEY_COUNT] = [
    kp(23019, 32037),
    kp(32037, 29295),
    kp(18789, 13603),
    kp(16443, 29533),
    kp(18189, 21952),
];

const KEY_CEILING: u32 = 65536;

/// `(Σ bytes(username) * 1000) mod 65536`.
pub fn hash(bytes: &[u8]) -> u32 {
    let sum: u64 = bytes.iter().map(|&b| b as u64).sum();
    ((sum * 1000) % KEY_CEILING as u64) as u32
}

fn server_key(robot_hash: u32, robot_id: usize) -> u32 {
    (robot_hash + KEYS[robot_id].server) % KEY_CEILING
}

/// Checks whether `client_key` is the correct response to `robot_hash` for
/// `robot_id`, i.e. `(client_key - KEYS[robot_id].client) mod 65536 == robot_hash`.
pub fn verify_client_key(client_key: u32, robot_id: usize, robot_hash: u32) -> bool {
    let diff = (client_key + KEY_CEILING - (KEYS[robot_id].client % KEY_CEILING)) % KEY_CEILING;
    diff == robot_hash
}

/// Outcome of a handshake attempt.
pub enum AuthOutcome {
    /// Authentication succeeded; robot identity confirmed.
    Success,
    /// Authentication failed in a way that already sent its own wire reply;
    /// the orchestrator should simply end the session.
    Failed(AuthFailureKind),
}

/// Runs the 4-message handshake described in the protocol spec, reading
/// through `reader` and writing the wire replies directly.
pub async fn authenticate<S>(
    reader: &mut RechargeAwareReader<S>,
) -> Result<AuthOutcome, SessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let username = reader.read_expected(MAX_USERNAME).await?;

    reader.send(&protocol::framed(MSG_KEY_REQUEST)).await?;

    let robot_id_raw = reader.read_expected(MAX_ROBOT_ID).await?;
    let robot_id_str = decode_ascii(&robot_id_raw)?;
    let robot_id: i64 = robot_id_str
        .parse()
        .map_err(|_| SessionError::syntax(format!("robot id not decimal: {robot_id_str:?}")))?;

    if robot_id < 0 || robot_id as usize >= KEYS.len() {
        reader.send(&protocol::framed(MSG_KEY_OUT_OF_RANGE)).await?;
        return Ok(AuthOutcome::Failed(AuthFailureKind::KeyOutOfRange));
    }
    let robot_id = robot_id as usize;

    let robot_hash = hash(&username);
    let challenge = server_key(robot_hash, robot_id);
    reader.send(&protocol::framed(&challenge.to_string())).await?;

    let client_key_raw = reader.read_expected(MAX_CLIENT_KEY).await?;
    let client_key_str = decode_ascii(&client_key_raw)?;
    let client_key: u32 = client_key_str
        .parse()
        .map_err(|_| SessionError::syntax(format!("client key not decimal: {client_key_str:?}")))?;

    if !verify_client_key(client_key, robot_id, robot_hash) {
        reader.send(&protocol::framed(MSG_LOGIN_FAILED)).await?;
        return Ok(AuthOutcome::Failed(AuthFailureKind::LoginFailed));
    }

    reader.send(&protocol::framed(MSG_OK)).await?;
    Ok(AuthOutcome::Success)
}

fn decode_ascii(bytes: &[u8]) -> Result<&str, SessionError> {
    std::str::from_utf8(bytes).map_err(|_| SessionError::syntax("expected ASCII decimal field"))
}
