//! Token Entity Module

pub mod one_time_token;

pub use one_time_token::{OneTimeToken, TokenPurpose};
