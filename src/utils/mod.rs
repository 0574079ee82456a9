pub mod address;
pub mod error;
pub mod logger;
pub mod validation;
