//! [`Error`]-related definitions.

use std::fmt;

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::typed_header::TypedHeaderRejection;
use derive_more::Error as StdError;
use itertools::Itertools as _;
use serde::Serialize;
use service::{domain::contract::Violation, infra::database};
use tracerr::{Trace, Traced};
use tracing as log;

/// Defines a new error type.
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_error {
    (
        enum $name:ident {
            $(
                #[code = $code:literal]
                #[status = $status_code:ident]
                #[message = $message:literal]
                $variant:ident
            ),* $(,)?
        }
    ) => {
        /// Error type.
        #[derive(
            Clone,
            Copy,
            Debug,
            ::derive_more::Display,
            ::derive_more::Error
        )]
        #[repr(u16)]
        pub enum $name {
            $(
                #[display($message)]
                #[doc = $message]
                $variant,
            )*
        }

        impl From<$name> for $crate::Error {
            fn from(err: $name) -> Self {
                match err {
                    $(
                        $name::$variant => Self {
                            code: $code,
                            status_code: ::http::StatusCode::$status_code,
                            message: $message.to_string(),
                            details: Vec::new(),
                            backtrace: None,
                        },
                    )*
                }
            }
        }
    };
}

/// REST API [`Error`].
#[derive(Clone, Debug, StdError)]
pub struct Error {
    /// [`Error`] code.
    pub code: Code,

    /// [`http::StatusCode`] of this [`Error`].
    pub status_code: http::StatusCode,

    /// Backtrace of this [`Error`].
    #[error(not(backtrace))]
    pub backtrace: Option<Trace>,

    /// [`Error`] message.
    pub message: String,

    /// Particular problems this [`Error`] consists of, if any.
    pub details: Vec<Detail>,
}

impl Error {
    /// Create a new [`Error`] representing an internal server error.
    #[must_use]
    pub fn internal(msg: &impl ToString) -> Self {
        Self {
            code: "INTERNAL_SERVER_ERROR",
            status_code: http::StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            details: Vec::new(),
            backtrace: None,
        }
    }

    /// Attaches the provided [`Detail`]s to this [`Error`].
    #[must_use]
    pub fn with_details(
        mut self,
        details: impl IntoIterator<Item = Detail>,
    ) -> Self {
        self.details.extend(details);
        self
    }

    /// Returns the [`Detail`]s rendered in the response body.
    ///
    /// An [`Error`] without particular [`Detail`]s is rendered as a single
    /// one, kinded by its [`Code`].
    fn body(self) -> Body {
        if self.details.is_empty() {
            Body {
                errors: vec![Detail {
                    field: None,
                    kind: self.code.to_owned(),
                    index: None,
                    message: self.message,
                }],
            }
        } else {
            Body {
                errors: self.details,
            }
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            code,
            status_code: _,
            backtrace,
            message,
            details,
        } = self;

        write!(
            f,
            "[{code}]: {message}{}{}",
            details
                .iter()
                .format_with("", |d, f| f(&format_args!("\n- {}", d.message))),
            backtrace
                .iter()
                .format_with("\n", |trace, f| f(&format_args!("{trace}"))),
        )
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        if self.status_code.is_server_error() {
            log::error!("{self}");
        }
        let status_code = self.status_code;
        (status_code, Json(self.body())).into_response()
    }
}

/// Response body of an [`Error`].
#[derive(Debug, Serialize)]
struct Body {
    /// Rendered [`Detail`]s.
    errors: Vec<Detail>,
}

/// Particular problem of an [`Error`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Detail {
    /// Name of the field the problem is about, if any.
    pub field: Option<String>,

    /// Kind of the problem.
    pub kind: String,

    /// Index of the offending element within the field, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,

    /// Human-readable description of the problem.
    pub message: String,
}

impl From<&Violation> for Detail {
    fn from(v: &Violation) -> Self {
        Self {
            field: Some(v.field.to_owned()),
            kind: v.kind.to_string(),
            index: v.index,
            message: v.message.clone(),
        }
    }
}

/// [`Error`] code.
pub type Code = &'static str;

/// Helper trait for converting types into [`Error`]s.
pub trait AsError {
    /// Tries to convert the type into an [`Error`].
    ///
    /// [`None`] is returned if the type cannot be converted into an [`Error`].
    fn try_as_error(&self) -> Option<Error>;

    /// Converts the type into an [`Error`].
    fn as_error(&self) -> Error
    where
        Self: fmt::Display,
    {
        self.try_as_error()
            .unwrap_or_else(|| Error::internal(&self))
    }

    /// Converts the type into an [`Error`] by consuming it.
    fn into_error(self) -> Error
    where
        Self: fmt::Display + Sized,
    {
        self.as_error()
    }
}

impl<E: AsError> AsError for Traced<E> {
    fn try_as_error(&self) -> Option<Error> {
        let mut error = self.as_ref().try_as_error()?;
        error.backtrace = Some(self.trace().clone());
        Some(error)
    }
}

define_error! {
    enum RequestError {
        #[code = "MALFORMED_BODY"]
        #[status = BAD_REQUEST]
        #[message = "Request body is malformed"]
        MalformedBody,

        #[code = "MALFORMED_HEADER"]
        #[status = BAD_REQUEST]
        #[message = "Request header is malformed"]
        MalformedHeader,

        #[code = "MALFORMED_PATH"]
        #[status = BAD_REQUEST]
        #[message = "Request path is malformed"]
        MalformedPath,
    }
}

/// Creates a [`RequestError`] carrying the provided rejection message.
pub(crate) fn rejected(err: RequestError, rejection: &impl ToString) -> Error {
    let mut error = Error::from(err);
    error.message = format!("{}: {}", error.message, rejection.to_string());
    error
}

impl AsError for JsonRejection {
    fn try_as_error(&self) -> Option<Error> {
        Some(rejected(RequestError::MalformedBody, self))
    }
}

impl AsError for PathRejection {
    fn try_as_error(&self) -> Option<Error> {
        Some(rejected(RequestError::MalformedPath, self))
    }
}

impl AsError for TypedHeaderRejection {
    fn try_as_error(&self) -> Option<Error> {
        Some(rejected(RequestError::MalformedHeader, self))
    }
}

impl AsError for database::Error {
    fn try_as_error(&self) -> Option<Error> {
        None
    }
}
