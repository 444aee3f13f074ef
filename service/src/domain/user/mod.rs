//! [`User`] access definitions.

pub mod session;

use std::collections::BTreeSet;

use common::define_kind;
use derive_more::{Display, From, FromStr, Into};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::contract::Section;

pub use self::session::Session;

/// ID of a platform user.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

define_kind! {
    #[doc = "Role of a platform user."]
    enum Role {
        #[doc = "Edits every [`Section`]."]
        Admin = 1,

        #[doc = "Edits money-related [`Section`]s."]
        Accountant = 2,

        #[doc = "Edits dates, documents, meters and internet."]
        Agent = 3,

        #[doc = "Edits nothing."]
        Viewer = 4,
    }
}

impl Role {
    /// Indicates whether this [`Role`] may edit the provided [`Section`].
    #[must_use]
    pub fn can_edit(self, section: Section) -> bool {
        use Section as S;

        match self {
            Self::Admin => true,
            Self::Accountant => matches!(
                section,
                S::Financial
                    | S::Payment
                    | S::Checks
                    | S::CustomRents
                    | S::Internet
                    | S::OtherFees
                    | S::Meters,
            ),
            Self::Agent => matches!(
                section,
                S::Dates | S::Documents | S::Meters | S::Internet,
            ),
            Self::Viewer => false,
        }
    }
}

/// Who performs an operation, passed explicitly to every [`Command`] that
/// modifies a contract.
///
/// [`Command`]: crate::Command
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Authorization {
    /// ID of the acting user.
    pub user_id: Id,

    /// [`Role`] of the acting user.
    pub role: Role,
}

impl Authorization {
    /// Returns the provided `sections` this [`Authorization`] may not edit.
    #[must_use]
    pub fn forbidden<'s>(
        &self,
        sections: impl IntoIterator<Item = &'s Section>,
    ) -> BTreeSet<Section> {
        sections
            .into_iter()
            .copied()
            .filter(|s| !self.role.can_edit(*s))
            .collect()
    }
}

impl From<Session> for Authorization {
    fn from(session: Session) -> Self {
        Self {
            user_id: session.user_id,
            role: session.role,
        }
    }
}
