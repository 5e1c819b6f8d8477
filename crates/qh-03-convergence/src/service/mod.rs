//! Service layer: the poll loop and the predicates built on it.

mod poller;
mod verifier;

pub use poller::ConvergencePoller;
pub use verifier::ConvergenceVerifier;
