//! Command implementations for the Catena CLI.

pub mod cloud;
pub mod hub;
pub mod readiness;
pub mod train;
pub mod validate;
