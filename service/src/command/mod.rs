//! [`Command`] definition.

pub mod authorize_session;
pub mod create_contract;
pub mod update_contract_terms;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    authorize_session::AuthorizeSession, create_contract::CreateContract,
    update_contract_terms::UpdateContractTerms,
};
