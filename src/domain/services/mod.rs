//! Domain Services
//!
//! Pure computations over domain state: the session clock and the
//! device liveness predicate.

pub mod clock;
pub mod liveness;

pub use clock::SessionClock;
