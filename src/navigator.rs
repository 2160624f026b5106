//! Online path planner
//!
//! Drives a [`Robot`] from an unknown starting pose to the origin using
//! only relative turns and unit moves, discovering obstacles as the robot
//! bumps into them. The robot has no map; every collision encountered is
//! remembered for the rest of the session.

use std::collections::HashSet;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::SessionError;
use crate::geometry::Vector;
use crate::protocol::{self, MAX_CLIENT_OK, MSG_MOVE, MSG_TURN_LEFT, MSG_TURN_RIGHT};
use crate::transport::recharge::RechargeAwareReader;

/// Per-session navigation state: where the robot is, which way it faces,
/// and which lattice points are known to be blocked.
pub struct Robot {
    pub position: Vector,
    pub direction: Vector,
    pub collisions: HashSet<Vector>,
    /// Count of `MOVE` commands issued while planning toward the goal
    /// (localization moves are tracked separately by the caller).
    pub moves_issued: u64,
}

impl Robot {
    pub const GOAL: Vector = Vector::ZERO;

    pub fn new(position: Vector, direction: Vector) -> Self {
        Robot {
            position,
            direction,
            collisions: HashSet::new(),
            moves_issued: 0,
        }
    }
}

/// Sends `102 MOVE` and parses the `OK <x> <y>` reply into a [`Vector`].
/// Any deviation from exactly three space-separated tokens is a syntax
/// error.
pub async fn cmd_move<S>(reader: &mut RechargeAwareReader<S>) -> Result<Vector, SessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    reader.send(&protocol::framed(MSG_MOVE)).await?;
    let reply = reader.read_expected(MAX_CLIENT_OK).await?;
    parse_ok_position(&reply)
}

/// Sends `103 TURN LEFT` and expects a framed `OK ...` reply.
pub async fn cmd_turn_left<S>(reader: &mut RechargeAwareReader<S>) -> Result<(), SessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    reader.send(&protocol::framed(MSG_TURN_LEFT)).await?;
    expect_ok(reader).await
}

/// Sends `104 TURN RIGHT` and expects a framed `OK ...` reply.
pub async fn cmd_turn_right<S>(reader: &mut RechargeAwareReader<S>) -> Result<(), SessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    reader.send(&protocol::framed(MSG_TURN_RIGHT)).await?;
    expect_ok(reader).await
}

async fn expect_ok<S>(reader: &mut RechargeAwareReader<S>) -> Result<(), SessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let reply = reader.read_expected(MAX_CLIENT_OK).await?;
    let text = std::str::from_utf8(&reply)
        .map_err(|_| SessionError::syntax("expected ASCII OK reply"))?;
    if !text.starts_with("OK") {
        return Err(SessionError::syntax(format!(
            "expected OK reply, got {text:?}"
        )));
    }
    Ok(())
}

fn parse_ok_position(reply: &[u8]) -> Result<Vector, SessionError> {
    let text =
        std::str::from_utf8(reply).map_err(|_| SessionError::syntax("expected ASCII MOVE reply"))?;
    let tokens: Vec<&str> = text.split(' ').collect();
    let [status, x_str, y_str] = tokens[..] else {
        return Err(SessionError::syntax(format!(
            "expected exactly 3 tokens in MOVE reply, got {text:?}"
        )));
    };
    if status != "OK" {
        return Err(SessionError::syntax(format!(
            "expected OK status in MOVE reply, got {text:?}"
        )));
    }
    let x: i64 = x_str
        .parse()
        .map_err(|_| SessionError::syntax(format!("non-integer x in MOVE reply: {text:?}")))?;
    let y: i64 = y_str
        .parse()
        .map_err(|_| SessionError::syntax(format!("non-integer y in MOVE reply: {text:?}")))?;
    Ok(Vector::new(x, y))
}

/// Localizes the robot's position and facing direction from two probe
/// moves, turning left and re-probing while the robot is blocked against
/// an obstacle directly in front of it.
///
/// Returns the localized position, facing direction, and the number of
/// `MOVE` commands it took.
pub async fn find_position_info<S>(
    reader: &mut RechargeAwareReader<S>,
) -> Result<(Vector, Vector, u64), SessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let p1 = cmd_move(reader).await?;
    let mut p2 = cmd_move(reader).await?;
    let mut moves = 2u64;

    while p2 == p1 {
        cmd_turn_left(reader).await?;
        p2 = cmd_move(reader).await?;
        moves += 1;
    }

    let direction = p2 - p1;
    Ok((p2, direction, moves))
}

/// Among the neighbours of `position`, picks the one with strictly
/// smallest Manhattan distance to [`Robot::GOAL`] that isn't a known
/// collision and isn't `prev_pos`. Ties keep the first (earliest in
/// [`Vector::neighbours`] order) candidate.
///
/// A boxed-in robot (three of four neighbours collisions, the fourth
/// excluded as `prev_pos`) leaves no eligible candidate; that is a
/// `SessionError::Logic`, not a panic — the client controls which moves
/// get reported as collisions, so this is reachable from client input.
fn best_next(
    position: Vector,
    prev_pos: Option<Vector>,
    collisions: &HashSet<Vector>,
) -> Result<Vector, SessionError> {
    let mut best: Option<(Vector, i64)> = None;
    for candidate in position.neighbours() {
        if collisions.contains(&candidate) || Some(candidate) == prev_pos {
            continue;
        }
        let dist = Vector::manhattan(candidate, Robot::GOAL);
        match best {
            Some((_, best_dist)) if dist >= best_dist => {}
            _ => best = Some((candidate, dist)),
        }
    }
    best.map(|(v, _)| v).ok_or_else(|| {
        SessionError::logic(format!("no eligible neighbour of {position:?} to move to"))
    })
}

/// Number of left rotations (0..=3) needed to turn `direction` to face
/// `target_direction`.
fn turns_to_face(mut direction: Vector, target_direction: Vector) -> Result<u8, SessionError> {
    for turns in 0..4u8 {
        if direction == target_direction {
            return Ok(turns);
        }
        direction = direction.left();
    }
    Err(SessionError::logic(
        "could not align facing direction with a true neighbour via left turns",
    ))
}

/// Drives the robot from its current (localized) pose to [`Robot::GOAL`],
/// discovering and routing around obstacles as moves are blocked.
pub async fn get_to_goal<S>(
    reader: &mut RechargeAwareReader<S>,
    robot: &mut Robot,
) -> Result<(), SessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut prev_pos: Option<Vector> = None;

    while robot.position != Robot::GOAL {
        let next_pos = best_next(robot.position, prev_pos, &robot.collisions)?;
        let target_direction = next_pos - robot.position;
        let turns = turns_to_face(robot.direction, target_direction)?;

        for _ in 0..turns {
            cmd_turn_left(reader).await?;
            robot.direction = robot.direction.left();
        }

        let position_before_step = robot.position;
        let new_pos = cmd_move(reader).await?;
        robot.moves_issued += 1;

        if new_pos == next_pos {
            robot.position = new_pos;
            prev_pos = Some(position_before_step);
        } else if new_pos == position_before_step {
            robot.collisions.insert(next_pos);
            // prev_pos deliberately left unchanged: the robot didn't move.
        } else {
            return Err(SessionError::logic(format!(
                "MOVE reported {new_pos:?}, neither the planned step {next_pos:?} nor the prior position {position_before_step:?}"
            )));
        }
    }

    Ok(())
}
