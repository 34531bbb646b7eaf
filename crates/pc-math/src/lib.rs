//! probcalc math utilities: stable log-domain primitives and PMF kernels.

pub mod math;

pub use math::stable::*;
pub use math::binomial::*;
pub use math::negative_binomial::*;
pub use math::geometric::*;
pub use math::poisson::*;
