//! Custom serialization/deserialization implementations.

/// ISO 8601 (RFC 3339) serde for [`time::PrimitiveDateTime`], which is
/// stored timezone-naive but always represents UTC.
pub mod iso8601 {
    use serde::{ser::Error as _, Deserialize, Deserializer, Serialize, Serializer};
    use time::{format_description::well_known::Rfc3339, OffsetDateTime, PrimitiveDateTime};

    /// Serialize as an RFC 3339 string with a `Z` designator.
    pub fn serialize<S>(date: &PrimitiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        date.assume_utc()
            .format(&Rfc3339)
            .map_err(S::Error::custom)?
            .serialize(serializer)
    }

    /// Deserialize from an RFC 3339 string, discarding the offset.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<PrimitiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        let utc = OffsetDateTime::parse(&raw, &Rfc3339).map_err(serde::de::Error::custom)?;
        Ok(PrimitiveDateTime::new(utc.date(), utc.time()))
    }

    /// Same as the parent module, for optional timestamps.
    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};
        use time::{format_description::well_known::Rfc3339, OffsetDateTime, PrimitiveDateTime};

        /// Serialize `Some` as RFC 3339, `None` as null.
        pub fn serialize<S>(
            date: &Option<PrimitiveDateTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match date {
                Some(date) => super::serialize(date, serializer),
                None => serializer.serialize_none(),
            }
        }

        /// Deserialize null as `None`, otherwise as RFC 3339.
        pub fn deserialize<'de, D>(
            deserializer: D,
        ) -> Result<Option<PrimitiveDateTime>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Option::<String>::deserialize(deserializer)?
                .map(|raw| {
                    OffsetDateTime::parse(&raw, &Rfc3339)
                        .map(|utc| PrimitiveDateTime::new(utc.date(), utc.time()))
                        .map_err(serde::de::Error::custom)
                })
                .transpose()
        }
    }
}
