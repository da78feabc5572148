use interview_client::ClientError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not signed in")]
    NotSignedIn,

    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Extra line printed below an error in pretty output.
pub fn hint_for(error: &anyhow::Error) -> Option<&'static str> {
    error.chain().find_map(|cause| {
        let client = match cause.downcast_ref::<CliError>() {
            Some(CliError::Client(e)) => e,
            Some(CliError::NotSignedIn) => return Some("Run `insight login` to sign in."),
            Some(_) => return None,
            None => cause.downcast_ref::<ClientError>()?,
        };
        client_hint(client)
    })
}

fn client_hint(error: &ClientError) -> Option<&'static str> {
    match error {
        e if e.requires_relogin() => Some("Your session has ended, please log in again."),
        ClientError::Unauthorized { .. } => Some("Run `insight login` to sign in."),
        e if e.is_transient() => {
            Some("The backend could not be reached. Check --base-url and try again.")
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_hint_for_expired_session() {
        let err: anyhow::Result<()> =
            Err(ClientError::session_expired("refresh token rejected")).context("Failed to list analyses");
        let err = err.unwrap_err();
        assert_eq!(
            hint_for(&err),
            Some("Your session has ended, please log in again.")
        );
    }

    #[test]
    fn test_no_hint_for_not_found() {
        let err = anyhow::Error::from(CliError::from(ClientError::not_found("/analyses/9/")));
        assert!(hint_for(&err).is_none());

        let err = anyhow::Error::from(CliError::InvalidInput("empty file".into()));
        assert!(hint_for(&err).is_none());
    }
}
