//! Byte-stream framing layers
//!
//! [`framed`] implements the delimiter-framed message transport; [`recharge`]
//! layers the `RECHARGING` / `FULL POWER` bracket on top of it. Both are
//! generic over any `AsyncRead + AsyncWrite` stream so they can be driven
//! against real sockets or in-memory duplex pairs in tests.

pub mod framed;
pub mod recharge;
