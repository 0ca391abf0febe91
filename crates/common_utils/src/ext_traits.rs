//! Extension traits on foreign types.

use std::str::FromStr;

use error_stack::report;

use crate::errors::{CustomResult, ParsingError};

/// Parsing helpers on strings.
pub trait StringExt<T> {
    /// Parse the string into an enum, naming the enum in the error report.
    fn parse_enum(self, enum_name: &'static str) -> CustomResult<T, ParsingError>
    where
        T: FromStr;
}

impl<T> StringExt<T> for String {
    fn parse_enum(self, enum_name: &'static str) -> CustomResult<T, ParsingError>
    where
        T: FromStr,
    {
        T::from_str(self.trim()).map_err(|_| report!(ParsingError::EnumParseFailure(enum_name)))
    }
}

impl<T> StringExt<T> for &str {
    fn parse_enum(self, enum_name: &'static str) -> CustomResult<T, ParsingError>
    where
        T: FromStr,
    {
        self.to_owned().parse_enum(enum_name)
    }
}
