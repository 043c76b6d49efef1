//! Contact form submission.

use axum::extract::rejection::FormRejection;
use axum::{Form, Json};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::error::ApiError;

const MAX_NAME_LEN: usize = 100;
const MAX_ADDRESS_LEN: usize = 200;
/// Sanitized values are cut to this many characters.
const MAX_SANITIZED_LEN: usize = 100;

/// Fields accepted by `POST /form`. Missing fields count as empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormData {
    pub name: String,
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormResponse {
    pub success: bool,
    pub message: String,
    pub data: FormData,
}

/// Why a submission was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("name is required")]
    NameRequired,
    #[error("address is required")]
    AddressRequired,
    #[error("name must be less than 100 characters")]
    NameTooLong,
    #[error("address must be less than 200 characters")]
    AddressTooLong,
}

/// Check a submission before it is sanitized. Lengths are in bytes.
pub fn validate(name: &str, address: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::NameRequired);
    }
    if address.trim().is_empty() {
        return Err(ValidationError::AddressRequired);
    }
    if name.len() > MAX_NAME_LEN {
        return Err(ValidationError::NameTooLong);
    }
    if address.len() > MAX_ADDRESS_LEN {
        return Err(ValidationError::AddressTooLong);
    }
    Ok(())
}

/// Trim, HTML-escape and truncate user input before echoing it back.
pub fn sanitize(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.trim().chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\'' => escaped.push_str("&#39;"),
            '"' => escaped.push_str("&#34;"),
            c => escaped.push(c),
        }
    }
    escaped.chars().take(MAX_SANITIZED_LEN).collect()
}

pub async fn submit(
    form: Result<Form<FormInput>, FormRejection>,
) -> Result<Json<FormResponse>, ApiError> {
    let Form(input) = form.map_err(|e| {
        warn!(error = %e, "Failed to parse form");
        ApiError::bad_request("Bad Request", "Failed to parse form data")
    })?;

    validate(&input.name, &input.address)
        .map_err(|e| ApiError::bad_request("Validation Error", e.to_string()))?;

    let data = FormData {
        name: sanitize(&input.name),
        address: sanitize(&input.address),
    };

    info!(name = %data.name, address = %data.address, "Form submitted");

    Ok(Json(FormResponse {
        success: true,
        message: "Form submitted successfully".to_owned(),
        data,
    }))
}
