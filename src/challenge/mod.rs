//! Challenge-collapsar admission built on the table and pool.
//!
//! Each client is identified by a [`Fingerprint`] of its Host header,
//! User-Agent and address. The first request from an unseen client stores a
//! fresh [`Verdict`] and gets challenged; later requests are judged by a
//! [`Verifier`] against the challenge kind recorded for them, and the result
//! is written back so that trusted and untrusted clients short-circuit until
//! their entry expires.

mod gate;
mod verdict;

use std::net::IpAddr;

use crate::clock::Timestamp;
use crate::hash::Key;
use crate::hash::KeyOps;
use crate::ops::Entry;
use crate::params::DefaultParams;
use crate::pool::Object;
use crate::table::Table;

pub use self::gate::Gate;
pub use self::gate::GateOutcome;
pub use self::gate::REPEAT_MAX;
pub use self::gate::Verifier;
pub use self::verdict::ChallengeKind;
pub use self::verdict::NodeStatus;
pub use self::verdict::TrustTally;
pub use self::verdict::Verdict;

/// Longest Host header prefix that contributes to a fingerprint.
pub const HOST_LEN_MAX: usize = 128;

/// Longest User-Agent prefix that contributes to a fingerprint.
pub const USER_AGENT_LEN_MAX: usize = 512;

/// A pooled challenge record.
pub type Node = Entry<Key, Verdict>;

/// A table of challenge verdicts whose records come from per-worker pools.
pub type ChallengeTable<P = DefaultParams> = Table<KeyOps<Verdict>, Object<Node>, P>;

// -----------------------------------------------------------------------------
// Request
// -----------------------------------------------------------------------------

/// The HTTP method of a request, as far as challenge selection cares.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Method {
  Get,
  Head,
  Post,
  Put,
  Delete,
  Connect,
  Options,
  Trace,
}

impl Method {
  /// The challenge issued to a new client: a captcha page for `GET`, a cookie
  /// redirect for everything else.
  #[inline]
  pub const fn challenge(self) -> ChallengeKind {
    match self {
      Self::Get => ChallengeKind::Captcha,
      _ => ChallengeKind::HttpCookie,
    }
  }
}

/// The parts of a request the gate looks at.
#[derive(Clone, Copy, Debug)]
pub struct Request<'a> {
  pub method: Method,
  pub host: &'a [u8],
  pub user_agent: &'a [u8],
  pub client: IpAddr,
  /// Deadline stored with a new entry.
  pub expiry: Timestamp,
}

// -----------------------------------------------------------------------------
// Fingerprint
// -----------------------------------------------------------------------------

/// The bytes hashed to identify a client.
///
/// Host (at most [`HOST_LEN_MAX`] bytes), then User-Agent (at most
/// [`USER_AGENT_LEN_MAX`] bytes), then the textual client address.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Fingerprint {
  bytes: Vec<u8>,
}

impl Fingerprint {
  pub fn new(host: &[u8], user_agent: &[u8], client: IpAddr) -> Self {
    let host: &[u8] = &host[..host.len().min(HOST_LEN_MAX)];
    let user_agent: &[u8] = &user_agent[..user_agent.len().min(USER_AGENT_LEN_MAX)];
    let client: String = client.to_string();

    let mut bytes: Vec<u8> = Vec::with_capacity(host.len() + user_agent.len() + client.len());

    bytes.extend_from_slice(host);
    bytes.extend_from_slice(user_agent);
    bytes.extend_from_slice(client.as_bytes());

    Self { bytes }
  }

  #[inline]
  pub fn of(request: &Request<'_>) -> Self {
    Self::new(request.host, request.user_agent, request.client)
  }

  #[inline]
  pub fn as_bytes(&self) -> &[u8] {
    &self.bytes
  }
}

impl AsRef<[u8]> for Fingerprint {
  #[inline]
  fn as_ref(&self) -> &[u8] {
    self.as_bytes()
  }
}
