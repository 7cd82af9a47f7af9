//! The `{ success, data, error }` wrapper every endpoint responds with.

use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub technical_error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<ErrorBody>,
}

impl<T> ApiResponse<T> {
    /// Unwrap the payload, turning `success: false` or a missing payload
    /// into an error labelled with `endpoint`.
    pub fn into_data(self, endpoint: &str) -> Result<T, ApiError> {
        self.check(endpoint)?;
        self.data.ok_or_else(|| ApiError::MissingData {
            endpoint: endpoint.to_string(),
        })
    }

    /// Like [`into_data`](Self::into_data) for endpoints whose payload is ignored.
    pub fn into_unit(self, endpoint: &str) -> Result<(), ApiError> {
        self.check(endpoint)
    }

    fn check(&self, endpoint: &str) -> Result<(), ApiError> {
        if self.success {
            return Ok(());
        }
        Err(ApiError::Rejected {
            endpoint: endpoint.to_string(),
            message: self.error_message(),
        })
    }

    /// Server-supplied error text, or a placeholder.
    pub fn error_message(&self) -> String {
        self.error
            .as_ref()
            .and_then(|e| e.message.clone().or_else(|| e.technical_error.clone()))
            .unwrap_or_else(|| "request was not successful".to_string())
    }
}
