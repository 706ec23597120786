use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Longest slug we accept or generate.
pub const MAX_SLUG_LEN: usize = 96;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SlugError {
    #[error("slug cannot be empty")]
    Empty,

    #[error("slug is longer than {MAX_SLUG_LEN} characters")]
    TooLong,

    #[error("slug contains an invalid character: {0:?}")]
    InvalidChar(char),

    #[error("slug has a leading, trailing or doubled hyphen")]
    MisplacedHyphen,
}

/// URL-safe program identifier: lowercase ASCII letters, digits and single
/// inner hyphens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProgramSlug(String);

impl ProgramSlug {
    /// Validate an existing slug without rewriting it.
    ///
    /// # Errors
    ///
    /// Returns `SlugError` when the value is not already in canonical form.
    pub fn parse(value: impl Into<String>) -> Result<Self, SlugError> {
        let value = value.into();
        if value.is_empty() {
            return Err(SlugError::Empty);
        }
        if value.len() > MAX_SLUG_LEN {
            return Err(SlugError::TooLong);
        }
        if let Some(bad) = value
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
        {
            return Err(SlugError::InvalidChar(bad));
        }
        if value.starts_with('-') || value.ends_with('-') || value.contains("--") {
            return Err(SlugError::MisplacedHyphen);
        }
        Ok(Self(value))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProgramSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ProgramSlug {
    type Error = SlugError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ProgramSlug> for String {
    fn from(slug: ProgramSlug) -> Self {
        slug.0
    }
}

fn fold_char(c: char) -> Option<&'static str> {
    let folded = match c {
        'à' | 'á' | 'â' | 'ä' | 'ã' | 'å' => "a",
        'ç' => "c",
        'è' | 'é' | 'ê' | 'ë' => "e",
        'ì' | 'í' | 'î' | 'ï' => "i",
        'ñ' => "n",
        'ò' | 'ó' | 'ô' | 'ö' | 'õ' => "o",
        'ù' | 'ú' | 'û' | 'ü' => "u",
        'ý' | 'ÿ' => "y",
        'œ' => "oe",
        'æ' => "ae",
        'ß' => "ss",
        _ => return None,
    };
    Some(folded)
}

/// Derive a slug from a free-form title.
///
/// Latin accents are folded to ASCII, every other run of non-alphanumeric
/// characters becomes a single hyphen.
///
/// # Errors
///
/// Returns `SlugError::Empty` if the title has no usable characters.
pub fn slugify(title: &str) -> Result<ProgramSlug, SlugError> {
    let mut out = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for c in title.chars().flat_map(char::to_lowercase) {
        let piece: Option<std::borrow::Cow<'static, str>> = if c.is_ascii_alphanumeric() {
            Some(c.to_string().into())
        } else {
            fold_char(c).map(Into::into)
        };
        match piece {
            Some(piece) => {
                if pending_hyphen && !out.is_empty() {
                    out.push('-');
                }
                pending_hyphen = false;
                out.push_str(&piece);
            }
            None => pending_hyphen = true,
        }
    }

    out.truncate(MAX_SLUG_LEN);
    let trimmed = out.trim_end_matches('-');
    ProgramSlug::parse(trimmed.to_owned())
}

/// Resolve a collision by appending `-2`, `-3`, ... until `is_taken` says no.
#[must_use]
pub fn unique_slug(base: &ProgramSlug, is_taken: impl Fn(&str) -> bool) -> ProgramSlug {
    if !is_taken(base.as_str()) {
        return base.clone();
    }
    let mut n: u32 = 2;
    loop {
        let suffix = format!("-{n}");
        let keep = MAX_SLUG_LEN.saturating_sub(suffix.len());
        let stem = base.as_str()[..base.as_str().len().min(keep)].trim_end_matches('-');
        let candidate = format!("{stem}{suffix}");
        if !is_taken(&candidate) {
            return ProgramSlug(candidate);
        }
        n = n.saturating_add(1);
    }
}
