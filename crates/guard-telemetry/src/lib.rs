//! This crate contains the tracing primitives shared by the Guard tools, most
//! notably the console and rolling file log subscribers.
pub mod tracing;

pub use tracing::Tracing;
