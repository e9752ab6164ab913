/// Converts a power ratio in decibels to linear scale.
pub fn db_to_linear(db: f64) -> f64 {
    10f64.powf(db / 10.0)
}

/// Converts a linear power ratio to decibels.
pub fn linear_to_db(linear: f64) -> f64 {
    10.0 * linear.log10()
}
