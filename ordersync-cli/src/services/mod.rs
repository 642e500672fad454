//! Business logic services.

pub mod reconcile;
