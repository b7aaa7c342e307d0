//! Value Object Module

pub mod login;
pub mod user_id;
