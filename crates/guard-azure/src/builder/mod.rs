//! This module provides builders for the (Kubernetes) objects the provider
//! adds to the Guard deployment.
//!
//! Like most builders in this crate they take `&mut self` and return
//! `&mut Self`, so calls can be chained on a temporary.
pub mod meta;
pub mod pod;
pub mod secret;
