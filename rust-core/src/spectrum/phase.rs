//! Phase unwrapping

use std::f64::consts::PI;

/// Unwrap a phase sequence in radians.
///
/// Whenever two neighbours differ by more than π, the later samples are
/// shifted by the multiple of 2π that brings the step back into [-π, π].
/// A step of exactly π keeps its sign.
pub fn unwrap_phase(phase: &[f64]) -> Vec<f64> {
    let mut unwrapped = Vec::with_capacity(phase.len());
    let Some(&first) = phase.first() else {
        return unwrapped;
    };
    unwrapped.push(first);

    let mut correction = 0.0;
    for pair in phase.windows(2) {
        let step = pair[1] - pair[0];
        if step.abs() >= PI {
            let mut wrapped = (step + PI).rem_euclid(2.0 * PI) - PI;
            if wrapped == -PI && step > 0.0 {
                wrapped = PI;
            }
            correction += wrapped - step;
        }
        unwrapped.push(pair[1] + correction);
    }

    unwrapped
}
