use thiserror::Error;

use crate::adapters::transport::TransportError;
use crate::domain::credential_cipher::KeyError;
use crate::domain::wire::DecodeError;

#[derive(Debug, Error)]
pub enum CarwingsError {
    #[error("not logged in")]
    NotAuthenticated,
    #[error("handshake failed: {0}")]
    HandshakeFailed(#[source] TransportError),
    #[error("login failed: {0}")]
    LoginFailed(#[source] LoginFailure),
    #[error(transparent)]
    Transport(TransportError),
    #[error("{endpoint} returned status code {status}")]
    ProtocolStatus { endpoint: &'static str, status: i64 },
    #[error("failed to retrieve updated info from vehicle")]
    UpdateFailed,
    #[error("vehicle update did not complete after {attempts} polls")]
    UpdateTimedOut { attempts: u32 },
    #[error("failed to decode response: {0}")]
    Decode(#[from] DecodeError),
    #[error("failed to encrypt password: {0}")]
    Key(#[from] KeyError),
}

#[derive(Debug, Error)]
pub enum LoginFailure {
    #[error(transparent)]
    Call(TransportError),
    #[error("no vehicle bound to account")]
    NoVehicle,
}

impl From<TransportError> for CarwingsError {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::ProtocolStatus { endpoint, status } => {
                Self::ProtocolStatus { endpoint, status }
            }
            // A reply without a status code counts as status 0.
            TransportError::MissingStatus { endpoint } => Self::ProtocolStatus {
                endpoint,
                status: 0,
            },
            other => Self::Transport(other),
        }
    }
}
