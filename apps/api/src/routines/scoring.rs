use crate::errors::AppError;

/// Solver score: `round((mood + productivity) * 10 / duration, 2)`.
///
/// Rounds on the exact decimal value of the quotient with ties to even, so
/// `5.625` becomes `5.62`. Zero duration is rejected before dividing, and any
/// non-finite result (infinite or NaN inputs) is refused rather than stored.
pub fn compute_solver_score(mood: f64, productivity: f64, duration: f64) -> Result<f64, AppError> {
    if duration == 0.0 {
        return Err(AppError::Processing(
            "duration must be non-zero to compute solver_score".to_string(),
        ));
    }
    let raw = (mood + productivity) * 10.0 / duration;
    if !raw.is_finite() {
        return Err(AppError::Processing(format!(
            "solver_score is not a finite number (mood={mood}, productivity={productivity}, duration={duration})"
        )));
    }
    round_half_even(raw, 2)
}

// Fixed-precision formatting expands the exact binary value and breaks ties to even.
fn round_half_even(value: f64, places: usize) -> Result<f64, AppError> {
    let text = format!("{value:.places$}");
    text.parse::<f64>()
        .map_err(|e| AppError::Processing(format!("could not round solver_score '{text}': {e}")))
}
