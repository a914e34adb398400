mod client;
mod project;
mod settings;

use std::str::FromStr;

use thiserror::Error;

pub use client::{Client, ClientRow};
pub use project::{PaymentStatus, Project, ProjectRow, ProjectStatus, ProjectType};
pub use settings::Settings;

/// Errors raised while turning stored rows into models
#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("unknown {field} value `{value}`")]
    UnknownVariant { field: &'static str, value: String },
}

fn parse_variant<T: FromStr>(field: &'static str, value: &str) -> Result<T, ModelError> {
    value.parse::<T>().map_err(|_| ModelError::UnknownVariant {
        field,
        value: value.to_string(),
    })
}
