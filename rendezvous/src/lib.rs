//! A filesystem-backed start-up barrier for multi-process jobs.
//!
//! One leader (rank 0) runs a one-time preparation step, such as downloading
//! model weights into a shared cache, and publishes the outcome through a
//! flag visible to every participant. Followers poll the flag until it reads
//! ready, or fail fast when the leader reports a failure.
//!
//! The leader is the only writer and the flag only moves from absent to a
//! final value, so no locking is required. A leader that crashes before
//! writing the flag still leaves followers waiting; pass a timeout in
//! [WaitOptions] to bound that.

mod common;

pub use error::*;
pub mod error;

pub use state::*;
pub mod state;

pub use store::*;
pub mod store;

pub use gate::*;
pub mod gate;

pub use config::*;
pub mod config;
