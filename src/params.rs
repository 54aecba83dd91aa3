//! Compile-time table parameters.

use core::any;
use core::fmt::Debug;
use core::fmt::Formatter;
use core::fmt::Result as FmtResult;
use core::marker::PhantomData;

pub use crate::array::CACHE_LINE;

// -----------------------------------------------------------------------------
// Configurable Params
// -----------------------------------------------------------------------------

/// Compile-time shape parameters for a [`Table`].
///
/// The defaults ([`DefaultParams`]) match the reference deployment: five probe
/// steps and three buckets per unit of declared capacity. Use [`ConstParams`]
/// to pick other values:
///
/// ```no_run
/// use cctab::ConstParams;
/// use cctab::Entry;
/// use cctab::Strategy;
/// use cctab::Table;
/// use cctab::hash::Key;
/// use cctab::hash::KeyOps;
///
/// type Wide = ConstParams<8, 4>;
///
/// let table: Table<KeyOps<u32>, Entry<Key, u32>, Wide> =
///   Table::with_params(1024, Strategy::Lru, KeyOps::new()).unwrap();
///
/// assert_eq!(table.probe_length(), 8);
/// assert_eq!(table.buckets(), 4096);
/// ```
///
/// [`Table`]: crate::table::Table
pub trait Params {
  /// Maximum number of consecutive buckets inspected by a single operation.
  const PROBE: usize = DefaultParams::PROBE;

  /// Buckets allocated per unit of declared capacity.
  const FACTOR: usize = DefaultParams::FACTOR;
}

// -----------------------------------------------------------------------------
// Configurable Params - Extensions
// -----------------------------------------------------------------------------

/// Derived parameters computed from [`Params`].
///
/// Automatically implemented for all [`Params`] types.
pub trait ParamsExt: Params + Sealed {
  /// Compile-time validation of the parameter set.
  const VALID: () = {
    assert!(Self::PROBE != 0, "invalid params: `PROBE` must be non-zero");
    assert!(Self::FACTOR != 0, "invalid params: `FACTOR` must be non-zero");
    assert!(
      Self::PROBE <= u32::MAX as usize,
      "invalid params: `PROBE` must fit in 32 bits",
    );
  };

  /// Forces evaluation of [`VALID`](Self::VALID).
  #[inline]
  fn validate() {
    #[allow(clippy::let_unit_value, reason = "forces const evaluation")]
    let () = Self::VALID;
  }

  /// Returns the bucket count for a declared `capacity`, or `None` on
  /// overflow.
  #[inline]
  fn buckets(capacity: usize) -> Option<usize> {
    capacity.checked_mul(Self::FACTOR)
  }

  #[inline]
  fn debug() -> DebugParams<Self> {
    DebugParams {
      marker: PhantomData,
    }
  }
}

// -----------------------------------------------------------------------------
// Debug Params
// -----------------------------------------------------------------------------

/// A helper type for displaying [`Params`] configuration.
#[derive(Clone, Copy)]
pub struct DebugParams<P>
where
  P: ?Sized,
{
  marker: PhantomData<fn(P)>,
}

impl<P> Debug for DebugParams<P>
where
  P: Params + ?Sized,
{
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct(any::type_name::<P>())
      .field("PROBE", &P::PROBE)
      .field("FACTOR", &P::FACTOR)
      .finish()
  }
}

// -----------------------------------------------------------------------------
// Default Params
// -----------------------------------------------------------------------------

/// The reference configuration: a probe window of 5 and a load factor of 3.
#[derive(Clone, Copy)]
#[non_exhaustive]
pub struct DefaultParams;

impl Debug for DefaultParams {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    Debug::fmt(&<Self as ParamsExt>::debug(), f)
  }
}

impl Params for DefaultParams {
  const PROBE: usize = 5;
  const FACTOR: usize = 3;
}

// -----------------------------------------------------------------------------
// Const-Generic Params
// -----------------------------------------------------------------------------

/// A [`Params`] implementation with compile-time configurable shape.
///
/// `N` is the probe length and `F` the load factor.
///
/// ```no_run
/// use cctab::ConstParams;
/// use cctab::Entry;
/// use cctab::Table;
/// use cctab::hash::Key;
/// use cctab::hash::KeyOps;
///
/// type NarrowTable<V> = Table<KeyOps<V>, Entry<Key, V>, ConstParams<2, 1>>;
/// ```
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
#[non_exhaustive]
pub struct ConstParams<const N: usize, const F: usize>;

impl<const N: usize, const F: usize> Params for ConstParams<N, F> {
  const PROBE: usize = N;
  const FACTOR: usize = F;
}

// -----------------------------------------------------------------------------
// Auto-implement Derive
// -----------------------------------------------------------------------------

mod private {
  pub trait Sealed {}
}

use private::Sealed;

impl<P> Sealed for P where P: Params + ?Sized {}
impl<P> ParamsExt for P where P: Params + ?Sized {}
