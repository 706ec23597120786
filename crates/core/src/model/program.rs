use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::ProgramId;
use crate::model::slug::ProgramSlug;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgramError {
    #[error("program title cannot be empty")]
    EmptyTitle,

    #[error("unknown publish status: {0}")]
    UnknownStatus(String),
}

/// Authoring status shared by programs and their units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishStatus {
    Draft,
    Published,
}

impl PublishStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PublishStatus::Draft => "draft",
            PublishStatus::Published => "published",
        }
    }

    /// # Errors
    ///
    /// Returns `ProgramError::UnknownStatus` for anything but `draft`/`published`.
    pub fn parse(value: &str) -> Result<Self, ProgramError> {
        match value {
            "draft" => Ok(PublishStatus::Draft),
            "published" => Ok(PublishStatus::Published),
            other => Err(ProgramError::UnknownStatus(other.to_owned())),
        }
    }
}

/// A multi-day learning course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    id: ProgramId,
    slug: ProgramSlug,
    title: String,
    description: Option<String>,
    status: PublishStatus,
    created_at: DateTime<Utc>,
}

impl Program {
    /// Creates a draft program.
    ///
    /// # Errors
    ///
    /// Returns `ProgramError::EmptyTitle` if the title is blank.
    pub fn new(
        id: ProgramId,
        slug: ProgramSlug,
        title: impl Into<String>,
        description: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ProgramError> {
        Self::from_persisted(
            id,
            slug,
            title,
            description,
            PublishStatus::Draft,
            created_at,
        )
    }

    /// Rehydrate a program from storage.
    ///
    /// # Errors
    ///
    /// Returns `ProgramError::EmptyTitle` if the title is blank.
    pub fn from_persisted(
        id: ProgramId,
        slug: ProgramSlug,
        title: impl Into<String>,
        description: Option<String>,
        status: PublishStatus,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ProgramError> {
        let title = title.into().trim().to_owned();
        if title.is_empty() {
            return Err(ProgramError::EmptyTitle);
        }
        let description = description
            .map(|d| d.trim().to_owned())
            .filter(|d| !d.is_empty());
        Ok(Self {
            id,
            slug,
            title,
            description,
            status,
            created_at,
        })
    }

    pub fn publish(&mut self) {
        self.status = PublishStatus::Published;
    }

    #[must_use]
    pub fn with_id(mut self, id: ProgramId) -> Self {
        self.id = id;
        self
    }

    #[must_use]
    pub fn id(&self) -> ProgramId {
        self.id
    }

    #[must_use]
    pub fn slug(&self) -> &ProgramSlug {
        &self.slug
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn status(&self) -> PublishStatus {
        self.status
    }

    #[must_use]
    pub fn is_published(&self) -> bool {
        self.status == PublishStatus::Published
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn slug() -> ProgramSlug {
        ProgramSlug::parse("sept-jours").unwrap()
    }

    #[test]
    fn new_program_starts_as_draft() {
        let program = Program::new(
            ProgramId::new(1),
            slug(),
            "  Sept jours  ",
            Some("   ".into()),
            fixed_now(),
        )
        .unwrap();
        assert_eq!(program.title(), "Sept jours");
        assert_eq!(program.description(), None);
        assert!(!program.is_published());
    }

    #[test]
    fn blank_title_is_rejected() {
        let err = Program::new(ProgramId::new(1), slug(), " ", None, fixed_now()).unwrap_err();
        assert_eq!(err, ProgramError::EmptyTitle);
    }

    #[test]
    fn publish_status_parses_storage_values() {
        assert_eq!(
            PublishStatus::parse("published").unwrap(),
            PublishStatus::Published
        );
        assert!(PublishStatus::parse("archived").is_err());
    }
}
