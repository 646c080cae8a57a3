use chrono::Utc;
use rand::Rng;

use super::error::StoreError;
use crate::meta::ObjectMeta;

const SUFFIX_ALPHABET: &[u8] = b"bcdfghjklmnpqrstvwxz2456789";
const SUFFIX_LENGTH: usize = 5;
const MAX_NAME_LENGTH: usize = 63;

/// Attempts a store makes before giving up on a colliding generated name.
pub(crate) const GENERATE_NAME_ATTEMPTS: usize = 8;

/// Completes a `generateName` prefix with a random suffix.
///
/// The prefix is truncated so the result never exceeds 63 bytes.
pub fn generate_name(base: &str) -> String {
    let mut cut = base.len().min(MAX_NAME_LENGTH - SUFFIX_LENGTH);
    while !base.is_char_boundary(cut) {
        cut -= 1;
    }

    let mut rng = rand::rng();
    let suffix: String = (0..SUFFIX_LENGTH)
        .map(|_| SUFFIX_ALPHABET[rng.random_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect();

    format!("{}{}", &base[..cut], suffix)
}

/// How a create request names the object it persists.
pub(crate) enum NameRequest<'a> {
    Explicit(&'a str),
    Generated(&'a str),
}

impl<'a> NameRequest<'a> {
    pub(crate) fn from_meta(meta: &'a ObjectMeta, kind: &str) -> Result<Self, StoreError> {
        if !meta.name.is_empty() {
            Ok(Self::Explicit(&meta.name))
        } else if !meta.generate_name.is_empty() {
            Ok(Self::Generated(&meta.generate_name))
        } else {
            Err(StoreError::InvalidRequest(format!(
                "{kind} must set name or generateName"
            )))
        }
    }

    pub(crate) fn candidate(&self) -> String {
        match self {
            Self::Explicit(name) => name.to_string(),
            Self::Generated(base) => generate_name(base),
        }
    }

    pub(crate) fn is_generated(&self) -> bool {
        matches!(self, Self::Generated(_))
    }
}

/// Fills in the metadata a store assigns on create.
pub(crate) fn stamp(meta: &mut ObjectMeta, name: String, resource_version: u64) {
    meta.name = name;
    meta.uid = Some(uuid::Uuid::new_v4().to_string());
    meta.resource_version = Some(resource_version.to_string());
    meta.creation_timestamp = Some(Utc::now());
}
