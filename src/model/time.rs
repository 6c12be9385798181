use super::*;

use ::time::OffsetDateTime;

impl From<OffsetDateTime> for Literal {
    fn from(value: OffsetDateTime) -> Self {
        Self::DateTime(value)
    }
}
