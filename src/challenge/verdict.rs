use core::fmt::Display;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;

use crate::ops::Ops;
use crate::ops::Record;
use crate::outcome::Assessment;
use crate::params::Params;
use crate::table::Table;

/// How far a client has progressed through its challenge.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum NodeStatus {
  /// Challenged, answer pending.
  #[default]
  Init,
  Trust,
  Untrust,
}

/// The challenge a client was issued.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum ChallengeKind {
  #[default]
  Captcha,
  HttpCookie,
  GetRedirect200,
  GetRedirect302,
  PostRedirect,
}

impl ChallengeKind {
  #[inline]
  pub const fn name(self) -> &'static str {
    match self {
      Self::Captcha => "captcha",
      Self::HttpCookie => "http-cookie",
      Self::GetRedirect200 => "get-redirect-200",
      Self::GetRedirect302 => "get-redirect-302",
      Self::PostRedirect => "post-redirect",
    }
  }
}

impl Display for ChallengeKind {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.write_str(self.name())
  }
}

/// The per-client state stored in a challenge table.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Verdict {
  pub status: NodeStatus,
  pub kind: ChallengeKind,
  /// Failed answers so far; only captchas are retried.
  pub attempts: u32,
}

impl Verdict {
  /// A fresh, unanswered challenge of `kind`.
  #[inline]
  pub const fn challenge(kind: ChallengeKind) -> Self {
    Self {
      status: NodeStatus::Init,
      kind,
      attempts: 0,
    }
  }
}

/// Trust counts gathered from one scan of a challenge table.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrustTally {
  pub init: usize,
  pub trust: usize,
  pub untrust: usize,
}

impl TrustTally {
  #[inline]
  pub fn record(&mut self, verdict: &Verdict) {
    match verdict.status {
      NodeStatus::Init => self.init += 1,
      NodeStatus::Trust => self.trust += 1,
      NodeStatus::Untrust => self.untrust += 1,
    }
  }

  /// Assesses `table`, tallying every stored verdict, expired or not.
  pub fn assess<O, R, P>(table: &Table<O, R, P>) -> (Self, Assessment)
  where
    O: Ops<Value = Verdict>,
    R: Record<Key = O::Key, Value = Verdict>,
    P: Params + ?Sized,
  {
    let mut tally: Self = Self::default();
    let assessment: Assessment = table.assess_with(|verdict| tally.record(verdict));

    (tally, assessment)
  }
}
