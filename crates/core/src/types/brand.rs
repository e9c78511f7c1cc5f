//! Brand identifier type.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// The external identifier of a brand.
///
/// Unlike the other entities, brands are addressed by a string key. The
/// value is trimmed on parse and must not be empty; it is compared against
/// the textual form of the `brand.id` column.
///
/// ## Examples
///
/// ```
/// use clothes_catalog_core::BrandId;
///
/// assert_eq!(BrandId::parse(" 12 ").unwrap().as_str(), "12");
/// assert!(BrandId::parse("").is_err());
/// assert!(BrandId::parse("   ").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct BrandId(String);

impl BrandId {
    /// Maximum accepted length of a brand identifier.
    pub const MAX_LENGTH: usize = 64;

    /// Parse a `BrandId` from a string.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` if the trimmed input is empty or
    /// longer than [`Self::MAX_LENGTH`].
    pub fn parse(s: &str) -> Result<Self, StoreError> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(StoreError::Validation("brand ID is required".to_owned()));
        }

        if trimmed.len() > Self::MAX_LENGTH {
            return Err(StoreError::Validation(format!(
                "brand ID must be at most {} characters",
                Self::MAX_LENGTH
            )));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `BrandId` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for BrandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for BrandId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for BrandId {
    type Error = StoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<BrandId> for String {
    fn from(id: BrandId) -> Self {
        id.0
    }
}

impl AsRef<str> for BrandId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for BrandId {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for BrandId {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for BrandId {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_whitespace() {
        assert_eq!(BrandId::parse("  nike ").unwrap().as_str(), "nike");
    }

    #[test]
    fn test_parse_empty_is_validation_error() {
        assert!(matches!(BrandId::parse(""), Err(StoreError::Validation(_))));
        assert!(matches!(BrandId::parse(" \t"), Err(StoreError::Validation(_))));
    }

    #[test]
    fn test_parse_too_long() {
        let long = "x".repeat(BrandId::MAX_LENGTH + 1);
        assert!(BrandId::parse(&long).is_err());
        assert!(BrandId::parse(&"x".repeat(BrandId::MAX_LENGTH)).is_ok());
    }

    #[test]
    fn test_serde_as_plain_string() {
        let id = BrandId::parse("5").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"5\"");
        let back: BrandId = serde_json::from_str("\" 5 \"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_deserialize_rejects_blank() {
        assert!(serde_json::from_str::<BrandId>("\"\"").is_err());
        assert!(serde_json::from_str::<BrandId>("\"   \"").is_err());
    }
}
