//! Users domain module.
//!
//! Customer accounts are owned elsewhere; this crate only models the fields
//! the order core reads from them.

pub mod user;

pub use user::{Address, User};
