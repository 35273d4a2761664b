use secrecy::SecretString;

/// The application user on whose behalf connection operations run.
///
/// How the user was authenticated is up to the host application; this crate
/// only needs a stable id and the credential to forward to the backend
/// authority.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub id: String,
    pub credential: SecretString,
}

impl SessionUser {
    pub fn new(id: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            credential: SecretString::new(credential.into()),
        }
    }
}

pub(crate) fn require_user(user: Option<&SessionUser>) -> Result<&SessionUser, crate::ConnectError> {
    user.ok_or_else(|| crate::ConnectError::NotAuthenticated.log())
}
