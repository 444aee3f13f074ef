//! [`Command`] for authorizing a [`Session`].

use derive_more::{Display, Error, From};
use jsonwebtoken::Validation;
use tracerr::Traced;

use crate::{
    domain::{
        user::{session, Session},
        Authorization,
    },
    Service,
};

use super::Command;

/// [`Command`] for authorizing a [`Session`] by its bearer token.
///
/// Tokens are issued elsewhere, this only verifies their signature and
/// expiration.
#[derive(Clone, Debug, From)]
pub struct AuthorizeSession {
    /// [`Session`] token to authorize.
    pub token: session::Token,
}

impl<Db> Command<AuthorizeSession> for Service<Db> {
    type Ok = Authorization;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AuthorizeSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AuthorizeSession { token } = cmd;

        let session = jsonwebtoken::decode::<Session>(
            token.as_ref(),
            &self.config().jwt_decoding_key,
            &Validation::default(),
        )
        .map_err(tracerr::from_and_wrap!(=> E))?
        .claims;

        Ok(session.into())
    }
}

/// Error of [`AuthorizeSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`jsonwebtoken`] decoding error.
    #[display("Failed to decode a JSON Web Token: {_0}")]
    JsonWebTokenDecodeError(jsonwebtoken::errors::Error),
}

#[cfg(test)]
mod spec {
    use common::DateTime;
    use jsonwebtoken::{EncodingKey, Header};

    use crate::{
        domain::user::{self, Role, Session},
        spec::{service, SECRET},
        Command as _,
    };

    use super::AuthorizeSession;

    fn token(session: &Session, secret: &[u8]) -> String {
        jsonwebtoken::encode(
            &Header::default(),
            session,
            &EncodingKey::from_secret(secret),
        )
        .unwrap()
    }

    fn session(expires_in: i64) -> Session {
        Session {
            user_id: user::Id::new(),
            role: Role::Accountant,
            expires_at: DateTime::from_unix_timestamp(
                DateTime::now().unix_timestamp() + expires_in,
            )
            .unwrap()
            .coerce(),
        }
    }

    #[tokio::test]
    async fn decodes_role_from_token() {
        let session = session(3600);

        let auth = service()
            .execute(AuthorizeSession {
                token: token(&session, SECRET).parse().unwrap(),
            })
            .await
            .unwrap();

        assert_eq!(auth.user_id, session.user_id);
        assert_eq!(auth.role, Role::Accountant);
    }

    #[tokio::test]
    async fn rejects_foreign_and_expired_tokens() {
        let svc = service();

        let foreign = svc
            .execute(AuthorizeSession {
                token: token(&session(3600), b"other").parse().unwrap(),
            })
            .await;
        assert!(foreign.is_err());

        let expired = svc
            .execute(AuthorizeSession {
                token: token(&session(-3600), SECRET).parse().unwrap(),
            })
            .await;
        assert!(expired.is_err());
    }
}
