//! Deployed pair-potential model checkpoints.
//!
//! A trained model is shipped as a TOML checkpoint holding per-species
//! Lennard-Jones parameters and a pair cutoff ([`params`]); [`pair`]
//! evaluates the analytic energy and per-atom forces of a configuration
//! under such a parameterization.

pub mod pair;
pub mod params;
