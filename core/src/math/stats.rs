pub struct StatsHelper;

impl StatsHelper {
    /// Largest absolute element-wise difference between two equal-length series.
    pub fn max_abs_deviation(lhs: &[f64], rhs: &[f64]) -> f64 {
        lhs.iter()
            .zip(rhs)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }

    /// Standard error of a proportion `p` estimated from `trials` samples.
    pub fn proportion_std_error(p: f64, trials: usize) -> f64 {
        if trials == 0 {
            return 0.0;
        }
        (p * (1.0 - p) / trials as f64).sqrt()
    }
}
