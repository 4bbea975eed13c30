use crate::models::ProviderKind;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AdapterError {
    #[error("Record [{position}] from [{provider}] could not be decoded: {message}")]
    Decode {
        provider: ProviderKind,
        position: usize,
        message: String
    },
    #[error("Record [{position}] from [{provider}] is missing required field [{field}]")]
    MissingField {
        provider: ProviderKind,
        position: usize,
        field: &'static str
    },
    #[error("Record [{position}] from [{provider}] has malformed field [{field}]: [{value}]")]
    MalformedField {
        provider: ProviderKind,
        position: usize,
        field: &'static str,
        value: String
    }
}

impl AdapterError {
    pub fn decode(provider: ProviderKind, position: usize, error: &serde_json::Error) -> Self {
        Self::Decode { provider, position, message: error.to_string() }
    }

    pub fn missing_field(provider: ProviderKind, position: usize, field: &'static str) -> Self {
        Self::MissingField { provider, position, field }
    }

    pub fn malformed_field(provider: ProviderKind, position: usize, field: &'static str, value: impl ToString) -> Self {
        Self::MalformedField { provider, position, field, value: value.to_string() }
    }
}
