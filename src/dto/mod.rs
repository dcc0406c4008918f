//! Request and response shapes exchanged with whatever transport sits in
//! front of the services.

pub mod transactions;

pub use transactions::*;
