/// Runs `$expr` once per parameter set, with `P` aliased to the set.
macro_rules! each_params {
  ($expr:expr) => {
    #[cfg(any(coverage, coverage_nightly, miri))]
    {
      $crate::utils::each_params!(
        @impl $expr,
        (1, 1), (5, 3),
      );
    }

    #[cfg(not(any(coverage, coverage_nightly, miri)))]
    {
      $crate::utils::each_params!(
        @impl $expr,
        (1, 1), (2, 1), (3, 2), (5, 3), (8, 2), (16, 4), (32, 1),
      );
    }
  };
  (@impl $expr:expr, $(($probe:expr, $factor:expr)),+ $(,)?) => {
    $(
      $crate::utils::each_params!(@run $expr, $probe, $factor);
    )+
  };
  (@run $expr:expr, $probe:expr, $factor:expr) => {{
    type P = $crate::params::ConstParams<{ $probe }, { $factor }>;
    $expr
  }};
}

pub(crate) use each_params;
