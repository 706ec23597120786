use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::UnitId;
use crate::model::program::PublishStatus;
use crate::model::slug::ProgramSlug;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum UnitError {
    #[error("unit title cannot be empty")]
    EmptyTitle,

    #[error("unit index must be >= 1")]
    InvalidIndex,

    #[error("unknown unit type: {0}")]
    UnknownType(String),

    #[error("journal field key cannot be empty")]
    EmptyKey,

    #[error("journal field key is declared twice: {0}")]
    DuplicateKey(String),

    #[error("slider {key} has min {min} >= max {max}")]
    InvalidSliderRange { key: String, min: f64, max: f64 },
}

/// Position of a unit inside its program. Ordering follows the learner's path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitType {
    Intro,
    Day,
    Conclusion,
}

impl UnitType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            UnitType::Intro => "intro",
            UnitType::Day => "day",
            UnitType::Conclusion => "conclusion",
        }
    }

    /// # Errors
    ///
    /// Returns `UnitError::UnknownType` for unrecognised values.
    pub fn parse(value: &str) -> Result<Self, UnitError> {
        match value {
            "intro" => Ok(UnitType::Intro),
            "day" => Ok(UnitType::Day),
            "conclusion" => Ok(UnitType::Conclusion),
            other => Err(UnitError::UnknownType(other.to_owned())),
        }
    }
}

impl std::fmt::Display for UnitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliderDef {
    pub key: String,
    pub label: String,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDef {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckDef {
    pub key: String,
    pub label: String,
}

/// What a learner is asked to fill in for one day.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JournalSchema {
    #[serde(default)]
    pub sliders: Vec<SliderDef>,
    #[serde(default)]
    pub questions: Vec<QuestionDef>,
    #[serde(default)]
    pub checks: Vec<CheckDef>,
}

fn check_keys<'a>(keys: impl Iterator<Item = &'a str>) -> Result<(), UnitError> {
    let mut seen = HashSet::new();
    for key in keys {
        if key.trim().is_empty() {
            return Err(UnitError::EmptyKey);
        }
        if !seen.insert(key) {
            return Err(UnitError::DuplicateKey(key.to_owned()));
        }
    }
    Ok(())
}

impl JournalSchema {
    /// # Errors
    ///
    /// Returns `UnitError` for blank or duplicate keys and inverted slider ranges.
    pub fn validate(&self) -> Result<(), UnitError> {
        check_keys(self.sliders.iter().map(|s| s.key.as_str()))?;
        check_keys(self.questions.iter().map(|q| q.key.as_str()))?;
        check_keys(self.checks.iter().map(|c| c.key.as_str()))?;
        for slider in &self.sliders {
            if !(slider.min.is_finite() && slider.max.is_finite()) || slider.min >= slider.max {
                return Err(UnitError::InvalidSliderRange {
                    key: slider.key.clone(),
                    min: slider.min,
                    max: slider.max,
                });
            }
        }
        Ok(())
    }

    pub fn required_questions(&self) -> impl Iterator<Item = &QuestionDef> {
        self.questions.iter().filter(|q| q.required)
    }

    #[must_use]
    pub fn slider(&self, key: &str) -> Option<&SliderDef> {
        self.sliders.iter().find(|s| s.key == key)
    }
}

/// One lesson of a program.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    id: UnitId,
    program_slug: ProgramSlug,
    unit_type: UnitType,
    unit_index: u32,
    title: String,
    journal: JournalSchema,
    status: PublishStatus,
}

impl Unit {
    /// Creates a draft unit.
    ///
    /// # Errors
    ///
    /// Returns `UnitError` on a blank title, a zero index or an invalid journal.
    pub fn new(
        id: UnitId,
        program_slug: ProgramSlug,
        unit_type: UnitType,
        unit_index: u32,
        title: impl Into<String>,
        journal: JournalSchema,
    ) -> Result<Self, UnitError> {
        Self::from_persisted(
            id,
            program_slug,
            unit_type,
            unit_index,
            title,
            journal,
            PublishStatus::Draft,
        )
    }

    /// Rehydrate a unit from storage.
    ///
    /// # Errors
    ///
    /// Returns `UnitError` on a blank title, a zero index or an invalid journal.
    pub fn from_persisted(
        id: UnitId,
        program_slug: ProgramSlug,
        unit_type: UnitType,
        unit_index: u32,
        title: impl Into<String>,
        journal: JournalSchema,
        status: PublishStatus,
    ) -> Result<Self, UnitError> {
        let title = title.into().trim().to_owned();
        if title.is_empty() {
            return Err(UnitError::EmptyTitle);
        }
        if unit_index == 0 {
            return Err(UnitError::InvalidIndex);
        }
        journal.validate()?;
        Ok(Self {
            id,
            program_slug,
            unit_type,
            unit_index,
            title,
            journal,
            status,
        })
    }

    pub fn publish(&mut self) {
        self.status = PublishStatus::Published;
    }

    #[must_use]
    pub fn with_id(mut self, id: UnitId) -> Self {
        self.id = id;
        self
    }

    #[must_use]
    pub fn id(&self) -> UnitId {
        self.id
    }

    #[must_use]
    pub fn program_slug(&self) -> &ProgramSlug {
        &self.program_slug
    }

    #[must_use]
    pub fn unit_type(&self) -> UnitType {
        self.unit_type
    }

    #[must_use]
    pub fn unit_index(&self) -> u32 {
        self.unit_index
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn journal(&self) -> &JournalSchema {
        &self.journal
    }

    #[must_use]
    pub fn status(&self) -> PublishStatus {
        self.status
    }

    /// Only published units of type `day` count toward a program's total.
    #[must_use]
    pub fn is_published_day(&self) -> bool {
        self.unit_type == UnitType::Day && self.status == PublishStatus::Published
    }
}
