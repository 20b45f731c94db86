use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("empty user message")]
    EmptyMessage,
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("model failure: {0}")]
    Model(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

/// What the HTTP boundary is allowed to say. Internal detail stays in the
/// `message` for logs; callers only ever see `user_message`.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "A mensagem não pôde ser processada. Verifique e tente novamente.",
            Self::ServiceUnavailable { .. } => {
                "Desculpe, estou com problemas para responder agora. Tente de novo em instantes."
            }
            Self::Internal { .. } => "Ocorreu um erro inesperado.",
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        match self {
            Self::Domain(domain) => InterfaceError::BadRequest {
                message: domain.to_string(),
                correlation_id,
            },
            Self::Persistence(message) | Self::Model(message) => {
                InterfaceError::ServiceUnavailable { message, correlation_id }
            }
            Self::Configuration(message) => InterfaceError::Internal { message, correlation_id },
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{ApplicationError, DomainError, InterfaceError};

    #[test]
    fn domain_error_maps_to_bad_request() {
        let interface = ApplicationError::from(DomainError::EmptyMessage).into_interface("req-1");
        assert!(matches!(
            interface,
            InterfaceError::BadRequest { ref correlation_id, .. } if correlation_id == "req-1"
        ));
    }

    #[test]
    fn model_failure_maps_to_service_unavailable_with_generic_text() {
        let interface =
            ApplicationError::Model("connection refused".to_owned()).into_interface("req-2");
        assert!(matches!(interface, InterfaceError::ServiceUnavailable { .. }));
        assert!(!interface.user_message().contains("connection refused"));
    }

    #[test]
    fn configuration_error_maps_to_internal() {
        let interface =
            ApplicationError::Configuration("missing model name".to_owned()).into_interface("req-3");
        assert!(matches!(interface, InterfaceError::Internal { .. }));
    }
}
