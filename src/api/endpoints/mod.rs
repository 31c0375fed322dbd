//! API endpoint handlers.

pub mod health;
pub mod onboarding;
pub mod upload;
