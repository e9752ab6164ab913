pub mod special;
pub mod stats;
pub mod units;

pub use special::{erfc, log_sum_exp};
pub use stats::StatsHelper;
pub use units::{db_to_linear, linear_to_db};
