//! The value-function interface the training methods are written against.

/// A differentiable state-value function V(features) → scalar.
///
/// Feature vectors of the wrong length are accepted everywhere: missing
/// trailing features read as zero and extra ones are ignored, so weights
/// survive growth of the feature set.
pub trait ValueFunction {
    /// Per-parameter accumulator for eligibility traces.
    type Trace;

    /// Number of input features the model consumes.
    fn input_len(&self) -> usize;

    fn evaluate(&self, features: &[f64]) -> f64;

    /// One semi-gradient step: θ ← θ + lr·(target − V(s))·∇V(s).
    fn step_toward(&mut self, features: &[f64], target: f64);

    /// A trace of all zeros shaped like the parameters.
    fn zero_trace(&self) -> Self::Trace;

    /// trace ← decay·trace + ∇V(s), at the current parameters.
    fn accumulate_gradient(&self, features: &[f64], trace: &mut Self::Trace, decay: f64);

    /// θ ← θ + lr·td_error·trace.
    fn apply_trace(&mut self, trace: &Self::Trace, td_error: f64);

    fn learning_rate(&self) -> f64;

    fn set_learning_rate(&mut self, learning_rate: f64);
}
