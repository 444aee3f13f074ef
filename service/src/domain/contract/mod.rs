//! [`Contract`] definitions.

pub mod check;
pub mod fee;
pub mod rent;
pub mod section;
pub mod session;
pub mod summary;
pub mod terms;
pub mod validation;
pub mod violation;

use std::collections::{BTreeMap, BTreeSet};

use common::{unit, DateTime, DateTimeOf};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use self::{
    section::{Patch, Section, SectionPatch},
    session::EditSession,
    summary::Summary,
    terms::{CheckRecord, Terms},
    violation::{Violation, Violations},
};

/// Rental contract.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    /// ID of this [`Contract`].
    pub id: Id,

    /// Current [`Version`] of this [`Contract`].
    pub version: Version,

    /// [`Terms`] of this [`Contract`].
    #[serde(flatten)]
    pub terms: Terms,

    /// [`Version`] each [`Section`] was last modified at.
    pub revisions: Revisions,

    /// [`DateTime`] when this [`Contract`] was created.
    #[serde(with = "common::datetime::serde::rfc3339")]
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Contract`] was last modified.
    #[serde(with = "common::datetime::serde::rfc3339")]
    pub updated_at: ModificationDateTime,
}

impl Contract {
    /// Creates a new [`Contract`] of the provided [`Terms`] at the
    /// [`Version::INITIAL`].
    #[must_use]
    pub fn new(terms: Terms) -> Self {
        let now = DateTime::now();
        Self {
            id: Id::new(),
            version: Version::INITIAL,
            terms,
            revisions: Section::ALL
                .iter()
                .map(|s| (*s, Version::INITIAL))
                .collect(),
            created_at: now.coerce(),
            updated_at: now.coerce(),
        }
    }

    /// Returns the provided `sections` modified after the `base` [`Version`].
    ///
    /// A `base` ahead of the current [`Version`] is unknown, so every
    /// provided section conflicts with it.
    #[must_use]
    pub fn conflicting_sections(
        &self,
        base: Version,
        sections: &BTreeSet<Section>,
    ) -> BTreeSet<Section> {
        if base > self.version {
            return sections.clone();
        }
        sections
            .iter()
            .copied()
            .filter(|s| self.revisions.get(s).is_some_and(|v| *v > base))
            .collect()
    }

    /// Replaces the [`Terms`] of this [`Contract`], bumping its [`Version`]
    /// and marking the provided `sections` as modified at it.
    pub fn revise(&mut self, terms: Terms, sections: &BTreeSet<Section>) {
        self.version = self.version.next();
        for s in sections {
            _ = self.revisions.insert(*s, self.version);
        }
        self.terms = terms;
        self.updated_at = DateTime::now().coerce();
    }
}

/// ID of a [`Contract`].
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
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Version of a [`Contract`], incremented by every save.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    Eq,
    FromStr,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Version(i64);

impl Version {
    /// [`Version`] of a newly created [`Contract`].
    pub const INITIAL: Self = Self(1);

    /// Returns the [`Version`] following this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// [`Version`] each [`Section`] of a [`Contract`] was last modified at.
pub type Revisions = BTreeMap<Section, Version>;

/// [`DateTime`] of a [`Contract`] creation.
pub type CreationDateTime = DateTimeOf<(Contract, unit::Creation)>;

/// [`DateTime`] of a [`Contract`] modification.
pub type ModificationDateTime = DateTimeOf<(Contract, unit::Modification)>;
