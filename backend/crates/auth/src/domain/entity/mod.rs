//! Entity Module

pub mod csrf_token;
pub mod session;
pub mod user;
