pub mod enums;
pub mod lab;
pub mod onboarding;

pub use enums::*;
pub use lab::*;
pub use onboarding::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid value '{value}' for {field}")]
    InvalidEnum { field: String, value: String },
}
