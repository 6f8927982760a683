use rand::{Rng, rng};

/// A source of random counter steps.
///
/// Used when a random delta is configured: each same-tick increment draws a
/// fresh step instead of applying the fixed delta. Abstracted as a trait so
/// tests can pin the step to a known value.
///
/// # Example
///
/// ```
/// use chronoflake::RandSource;
///
/// struct FixedStep;
/// impl RandSource for FixedStep {
///     fn sample_step(&self, _upper: u32) -> u32 {
///         7
///     }
/// }
///
/// assert_eq!(FixedStep.sample_step(100), 7);
/// ```
pub trait RandSource {
    /// Returns a uniformly distributed step in `1..=upper`.
    ///
    /// `upper` is always at least 1 when called by the generator; the
    /// configured random delta is validated to be non-zero.
    fn sample_step(&self, upper: u32) -> u32;
}

/// A [`RandSource`] backed by the thread-local RNG.
///
/// Each OS thread has its own generator instance, so concurrent callers never
/// contend. This type stores nothing itself; it reaches for the thread-local
/// state on every call, which keeps it freely shareable across threads.
#[derive(Default, Clone, Debug)]
pub struct ThreadRandom;

impl RandSource for ThreadRandom {
    fn sample_step(&self, upper: u32) -> u32 {
        rng().random_range(1..=upper)
    }
}
