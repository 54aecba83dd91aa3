use core::fmt::Debug;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;

use tracing::debug;
use tracing::trace;

use crate::challenge::ChallengeKind;
use crate::challenge::ChallengeTable;
use crate::challenge::Fingerprint;
use crate::challenge::Node;
use crate::challenge::NodeStatus;
use crate::challenge::Request;
use crate::challenge::Verdict;
use crate::clock::Timestamp;
use crate::error::PoolError;
use crate::hash::Key;
use crate::outcome::Found;
use crate::outcome::Insert;
use crate::params::DefaultParams;
use crate::params::Params;
use crate::pool::Object;
use crate::pool::Pool;

/// Once a client's failed captcha count exceeds this, it is refused instead
/// of challenged again.
pub const REPEAT_MAX: u32 = 5;

/// Checks a client's answer to an issued challenge.
pub trait Verifier {
  /// Returns whether `request` answers a challenge of `kind`, or `None` when
  /// this verifier cannot check that kind.
  fn verify(&mut self, kind: ChallengeKind, request: &Request<'_>) -> Option<bool>;
}

impl<F> Verifier for F
where
  F: FnMut(ChallengeKind, &Request<'_>) -> Option<bool>,
{
  #[inline]
  fn verify(&mut self, kind: ChallengeKind, request: &Request<'_>) -> Option<bool> {
    self(kind, request)
  }
}

/// What to do with a request.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum GateOutcome {
  /// Unseen client; send the initial challenge.
  Begin,
  /// Trusted; pass the request through.
  Success,
  /// Untrusted or unverifiable; drop the request.
  Failed,
  /// Wrong captcha answer with retries left; challenge again.
  Repeat,
}

/// One worker's view of the challenge flow.
///
/// The table is shared between workers; the pool that feeds it new records
/// belongs to this gate alone.
pub struct Gate<'table, V, P = DefaultParams>
where
  P: Params + ?Sized,
{
  table: &'table ChallengeTable<P>,
  pool: Pool<Node>,
  verifier: V,
}

impl<'table, V, P> Gate<'table, V, P>
where
  V: Verifier,
  P: Params + ?Sized,
{
  /// Creates a gate over `table` that draws records from `pool`.
  #[inline]
  pub fn new(table: &'table ChallengeTable<P>, pool: Pool<Node>, verifier: V) -> Self {
    Self {
      table,
      pool,
      verifier,
    }
  }

  #[inline]
  pub fn table(&self) -> &'table ChallengeTable<P> {
    self.table
  }

  #[inline]
  pub fn pool(&self) -> &Pool<Node> {
    &self.pool
  }

  #[inline]
  pub fn pool_mut(&mut self) -> &mut Pool<Node> {
    &mut self.pool
  }

  /// Returns the pool and verifier, releasing the table borrow.
  #[inline]
  pub fn into_parts(self) -> (Pool<Node>, V) {
    (self.pool, self.verifier)
  }

  /// Runs one request through the challenge state machine.
  pub fn check(&mut self, request: &Request<'_>) -> GateOutcome {
    let fingerprint: Fingerprint = Fingerprint::of(request);

    match self.table.get(fingerprint.as_bytes()) {
      None => self.begin(&fingerprint, request),
      Some(Found { value, stamp }) => self.resume(&fingerprint, request, value, stamp),
    }
  }

  fn begin(&mut self, fingerprint: &Fingerprint, request: &Request<'_>) -> GateOutcome {
    let verdict: Verdict = Verdict::challenge(request.method.challenge());

    let object: Object<Node> = match self.pool.get_object(Node::new(Key::default(), verdict)) {
      Ok(object) => object,
      Err(error) => {
        debug!(%error, "no record for new client");
        return GateOutcome::Failed;
      }
    };

    let inserted: Insert<Object<Node>> =
      self
        .table
        .insert(fingerprint.as_bytes(), object, request.expiry);

    trace!(outcome = inserted.name(), kind = %verdict.kind, "challenged new client");

    if let Some(object) = inserted.into_record() {
      // Rejection is logged by the pool; nothing else to do with the record.
      let _reclaimed: Result<(), PoolError> = self.pool.put_object(object);
    }

    GateOutcome::Begin
  }

  fn resume(
    &mut self,
    fingerprint: &Fingerprint,
    request: &Request<'_>,
    mut verdict: Verdict,
    stamp: Timestamp,
  ) -> GateOutcome {
    let extends: bool = request.expiry > stamp;

    let (outcome, write_back): (GateOutcome, bool) = match verdict.status {
      NodeStatus::Trust => (GateOutcome::Success, extends),
      NodeStatus::Untrust => (GateOutcome::Failed, extends),
      NodeStatus::Init => match self.verifier.verify(verdict.kind, request) {
        None => {
          debug!(kind = %verdict.kind, "no verifier for challenge kind");
          (GateOutcome::Failed, true)
        }
        Some(true) => {
          verdict.status = NodeStatus::Trust;
          (GateOutcome::Success, true)
        }
        Some(false) if verdict.kind == ChallengeKind::Captcha => {
          if verdict.attempts > REPEAT_MAX {
            (GateOutcome::Failed, true)
          } else {
            verdict.attempts += 1;
            (GateOutcome::Repeat, true)
          }
        }
        Some(false) => {
          verdict.status = NodeStatus::Untrust;
          (GateOutcome::Failed, true)
        }
      },
    };

    if write_back {
      let _updated: bool = self.table.update(fingerprint.as_bytes(), |stored| {
        *stored = verdict;
      });
    }

    outcome
  }
}

impl<V, P> Debug for Gate<'_, V, P>
where
  P: Params + ?Sized,
{
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("Gate")
      .field("table", self.table)
      .field("pool", &self.pool)
      .finish_non_exhaustive()
  }
}
