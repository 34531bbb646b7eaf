//! Core math modules.

pub mod stable;
pub mod binomial;
pub mod negative_binomial;
pub mod geometric;
pub mod poisson;
