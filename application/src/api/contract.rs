//! [`Contract`]-related REST API handlers.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path,
    },
    response::{IntoResponse, Response},
    Json,
};
use http::{header, HeaderMap, HeaderValue, StatusCode};
use service::{
    command::{self, Command as _},
    domain::{
        contract::{self, violation, Patch, Section, Terms},
        Contract,
    },
    query::{self, Query as _},
};

use crate::{
    define_error, error::RequestError, AsError, Context, Detail, Error,
};

/// Creates a new [`Contract`] of the provided [`Terms`].
///
/// # Errors
///
/// Possible error codes:
/// - `FORBIDDEN_SECTIONS` - user may not edit every section;
/// - `INVALID_TERMS` - provided [`Terms`] violate some invariants.
#[tracing::instrument(
    skip_all,
    fields(
        http.handler = "createContract",
        user_id = %ctx.authorization().user_id,
    ),
)]
pub async fn create(
    ctx: Context,
    terms: Result<Json<Terms>, JsonRejection>,
) -> Result<Response, Error> {
    let Json(terms) = terms.map_err(AsError::into_error)?;

    let contract = ctx
        .service()
        .execute(command::CreateContract {
            terms,
            authorization: ctx.authorization(),
        })
        .await
        .map_err(AsError::into_error)?;

    respond(StatusCode::CREATED, contract)
}

/// Returns the [`Contract`] with the provided ID.
///
/// # Errors
///
/// Possible error codes:
/// - `CONTRACT_NOT_FOUND` - [`Contract`] doesn't exist.
#[tracing::instrument(
    skip_all,
    fields(
        contract_id = tracing::field::Empty,
        http.handler = "getContract",
    ),
)]
pub async fn get(
    ctx: Context,
    id: Result<Path<contract::Id>, PathRejection>,
) -> Result<Response, Error> {
    let Path(id) = id.map_err(AsError::into_error)?;
    _ = tracing::Span::current()
        .record("contract_id", tracing::field::display(id));

    let contract = ctx
        .service()
        .execute(query::contract::ById::by(id))
        .await
        .map_err(AsError::into_error)?
        .ok_or_else(|| Error::from(ContractError::NotFound))?;

    respond(StatusCode::OK, contract)
}

/// Returns the financial summary of the [`Contract`] with the provided ID.
///
/// # Errors
///
/// Possible error codes:
/// - `CONTRACT_NOT_FOUND` - [`Contract`] doesn't exist.
#[tracing::instrument(
    skip_all,
    fields(
        contract_id = tracing::field::Empty,
        http.handler = "getContractSummary",
    ),
)]
pub async fn summary(
    ctx: Context,
    id: Result<Path<contract::Id>, PathRejection>,
) -> Result<Response, Error> {
    let Path(id) = id.map_err(AsError::into_error)?;
    _ = tracing::Span::current()
        .record("contract_id", tracing::field::display(id));

    let summary = ctx
        .service()
        .execute(query::contract::SummaryById(id))
        .await
        .map_err(AsError::into_error)?
        .ok_or_else(|| Error::from(ContractError::NotFound))?;

    Ok(Json(summary).into_response())
}

/// Returns the monthly rent periods of the [`Contract`] with the provided ID.
///
/// # Errors
///
/// Possible error codes:
/// - `CONTRACT_NOT_FOUND` - [`Contract`] doesn't exist.
#[tracing::instrument(
    skip_all,
    fields(
        contract_id = tracing::field::Empty,
        http.handler = "getContractSchedule",
    ),
)]
pub async fn schedule(
    ctx: Context,
    id: Result<Path<contract::Id>, PathRejection>,
) -> Result<Response, Error> {
    let Path(id) = id.map_err(AsError::into_error)?;
    _ = tracing::Span::current()
        .record("contract_id", tracing::field::display(id));

    let periods = ctx
        .service()
        .execute(query::contract::ScheduleById(id))
        .await
        .map_err(AsError::into_error)?
        .ok_or_else(|| Error::from(ContractError::NotFound))?;

    Ok(Json(periods).into_response())
}

/// Updates the sections of the [`Contract`] with the provided ID touched by
/// the provided [`Patch`].
///
/// If the `If-Match` header carries a version, the update is rejected if any
/// touched section was modified after it.
///
/// # Errors
///
/// Possible error codes:
/// - `CONTRACT_NOT_FOUND` - [`Contract`] doesn't exist;
/// - `EDIT_CONFLICT` - touched sections were modified concurrently;
/// - `FORBIDDEN_SECTIONS` - user may not edit some touched sections;
/// - `INVALID_TERMS` - updated [`Terms`] violate some invariants;
/// - `NOTHING_TO_UPDATE` - [`Patch`] touches no section.
#[tracing::instrument(
    skip_all,
    fields(
        contract_id = tracing::field::Empty,
        http.handler = "updateContract",
        user_id = %ctx.authorization().user_id,
    ),
)]
pub async fn update(
    ctx: Context,
    id: Result<Path<contract::Id>, PathRejection>,
    headers: HeaderMap,
    patch: Result<Json<Patch>, JsonRejection>,
) -> Result<Response, Error> {
    let Path(id) = id.map_err(AsError::into_error)?;
    _ = tracing::Span::current()
        .record("contract_id", tracing::field::display(id));
    let expected_version = expected_version(&headers)?;
    let Json(patch) = patch.map_err(AsError::into_error)?;

    let contract = ctx
        .service()
        .execute(command::UpdateContractTerms {
            contract_id: id,
            expected_version,
            patches: patch.into_sections(),
            authorization: ctx.authorization(),
        })
        .await
        .map_err(AsError::into_error)?;

    respond(StatusCode::OK, contract)
}

/// Renders the provided [`Contract`] along with its `ETag`.
fn respond(status: StatusCode, contract: Contract) -> Result<Response, Error> {
    let etag = HeaderValue::try_from(etag(contract.version))
        .map_err(|e| Error::internal(&e))?;
    Ok((status, [(header::ETAG, etag)], Json(contract)).into_response())
}

/// Formats the provided [`contract::Version`] as an entity tag.
fn etag(version: contract::Version) -> String {
    format!("\"{version}\"")
}

/// Parses the [`contract::Version`] the request is based on from its
/// `If-Match` header.
///
/// [`None`] means any version, either the header is absent or it's `*`.
fn expected_version(
    headers: &HeaderMap,
) -> Result<Option<contract::Version>, Error> {
    let malformed = |e: &dyn ToString| {
        crate::error::rejected(RequestError::MalformedHeader, &e.to_string())
    };

    let Some(value) = headers.get(header::IF_MATCH) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|e| malformed(&e))?.trim();
    if value == "*" {
        return Ok(None);
    }

    let tag = value.strip_prefix("W/").unwrap_or(value);
    let tag = tag
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(tag);
    tag.parse().map(Some).map_err(|e| {
        malformed(&format!("`If-Match: {value}` is not a version: {e}"))
    })
}

define_error! {
    enum ContractError {
        #[code = "CONTRACT_NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "`Contract` does not exist"]
        NotFound,

        #[code = "EDIT_CONFLICT"]
        #[status = CONFLICT]
        #[message = "Sections were modified concurrently"]
        Conflict,

        #[code = "FORBIDDEN_SECTIONS"]
        #[status = FORBIDDEN]
        #[message = "Not allowed to edit some sections"]
        ForbiddenSections,

        #[code = "INVALID_TERMS"]
        #[status = UNPROCESSABLE_ENTITY]
        #[message = "`Contract` terms are invalid"]
        InvalidTerms,

        #[code = "NOTHING_TO_UPDATE"]
        #[status = BAD_REQUEST]
        #[message = "No section is touched"]
        NothingToUpdate,
    }
}

/// Creates a [`ContractError::ForbiddenSections`] detailing the provided
/// [`Section`]s.
fn forbidden<'s>(sections: impl IntoIterator<Item = &'s Section>) -> Error {
    Error::from(ContractError::ForbiddenSections).with_details(
        sections.into_iter().map(|s| Detail {
            field: Some(s.to_string()),
            kind: "Forbidden".to_owned(),
            index: None,
            message: format!("Not allowed to edit `{s}` section"),
        }),
    )
}

/// Creates a [`ContractError::InvalidTerms`] detailing the provided
/// [`contract::Violations`].
fn invalid(violations: &contract::Violations) -> Error {
    Error::from(ContractError::InvalidTerms)
        .with_details(violations.as_slice().iter().map(Detail::from))
}

impl AsError for command::create_contract::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Forbidden(sections) => Some(forbidden(sections)),
            Self::Invalid(violations) => Some(invalid(violations)),
        }
    }
}

impl AsError for command::update_contract_terms::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Conflict { sections, current } => Some(
                Error::from(ContractError::Conflict).with_details(
                    sections.iter().map(|s| Detail {
                        field: Some(s.to_string()),
                        kind: violation::Kind::Conflict.to_string(),
                        index: None,
                        message: format!(
                            "`{s}` section was modified concurrently, current \
                             version is {}",
                            etag(*current),
                        ),
                    }),
                ),
            ),
            Self::ContractNotExists(_) => Some(ContractError::NotFound.into()),
            Self::Db(e) => e.try_as_error(),
            Self::Forbidden(sections) => Some(forbidden(sections)),
            Self::Invalid(violations) => Some(invalid(violations)),
            Self::NothingToUpdate => {
                Some(ContractError::NothingToUpdate.into())
            }
        }
    }
}

impl AsError for query::contract::ReportError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Schedule(_) | Self::Summary(_) => None,
        }
    }
}
