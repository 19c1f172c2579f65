use std::{error::Error, fmt};

/// An enum value couldn't be parsed from a string.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ParseEnumError {
    pub value: String,
    pub enum_name: &'static str,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "failed to parse \"{}\" as {}",
            &self.value, &self.enum_name
        )
    }
}

impl Error for ParseEnumError {}

/// Parses an enum from its XML/mnemonic string form, matched
/// case-insensitively against the variant name.
pub trait EnumFromStr: Sized {
    fn from_str(s: &str) -> Result<Self, ParseEnumError>;
}
