//! The atopic dermatitis skin model: parameters, state layout, right-hand side and EASI scoring.

mod drift;
mod easi;
mod parameters;
mod state;

pub use drift::{drift, jacobian_vector_product};
pub use easi::{easi, easi_series, EASI_MAX};
pub use parameters::{Parameters, NPARAMS};
pub use state::{baseline_factor_names, Compartment, StateVector, INITIAL_STATE, NSTATES};
