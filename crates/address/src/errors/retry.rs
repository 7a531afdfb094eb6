/// Classification for failover policy.
///
/// Used by the geocoding gateway to decide how to treat a failed attempt.
///
/// # Behavior Summary
///
/// | Class | Try Next Provider? | Record Health Failure? |
/// |-------|-------------------|------------------------|
/// | `Never` | No | No |
/// | `FailoverWithPenalty` | Yes | Yes (affects future ordering) |
/// | `NextProvider` | Yes | No |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Never retry - missing configuration or credentials.
    /// The other backend cannot fix the problem.
    Never,

    /// Failover to next provider and record a health penalty.
    ///
    /// Used for transport errors, timeouts, non-success statuses and
    /// unparseable bodies. Once failures accumulate past the threshold the
    /// healthy backend is ordered first.
    FailoverWithPenalty,

    /// Try next provider without recording any penalty.
    ///
    /// Used when this backend could not serve the request but is not
    /// misbehaving.
    NextProvider,
}
