//! Request handlers.
//!
//! Handlers unpack the request, delegate to the sync engine, and wrap the
//! result in the protocol envelopes from [`crate::response`].

pub mod crud;
