//! Raw score to percentage conversion.

/// Round to 2 decimal places, half-up on the third decimal.
pub fn round2(value: f64) -> f64 {
    ((value * 100.0) + 0.5).floor() / 100.0
}

/// Convert a raw point score into a percentage of `total_marks`.
///
/// Returns `None` when the test has no usable maximum (`total_marks <= 0`) or when either
/// input is not finite. A `None` percentage is excluded from every average and bucket.
pub fn normalize(raw_score: f64, total_marks: f64) -> Option<f64> {
    if !raw_score.is_finite() || !total_marks.is_finite() || total_marks <= 0.0 {
        return None;
    }
    Some(round2(raw_score / total_marks * 100.0))
}

/// Mean of already-normalized percentages, rounded. `None` for an empty input.
pub fn mean_pct<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0.0_f64, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(round2(sum / count as f64))
    }
}
