//! The `OSC 1337 ; Custom=id=<identity>:<payload>` escape sequence.
//!
//! A program running inside a terminal writes this sequence to its output and
//! the host turns it into a `custom_escape_sequence` notification. From a shell:
//!
//! ```text
//! printf "\033]1337;Custom=id=%s:%s\a" "shared-secret" "create-window"
//! ```

use std::{error::Error as StdError, fmt, str::FromStr};

const OSC_PREFIX: &str = "\x1b]1337;Custom=id=";
const BEL: char = '\x07';
const ST: &str = "\x1b\\";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    NotCustomSequence,
    MissingTerminator,
    MissingSeparator,
    /// A field contains a character that would end or split the sequence early.
    InvalidField { field: &'static str, found: char },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotCustomSequence => write!(f, "not an OSC 1337 Custom sequence"),
            Self::MissingTerminator => write!(f, "sequence is not terminated by BEL or ST"),
            Self::MissingSeparator => write!(f, "missing ':' between identity and payload"),
            Self::InvalidField { field, found } => {
                write!(f, "{field} contains forbidden character {found:?}")
            }
        }
    }
}

impl StdError for ParseError {}

/// Identity and payload carried by a custom escape sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomEscape {
    pub identity: String,
    pub payload: String,
}

impl CustomEscape {
    /// Validates both fields so that the encoded sequence decodes back unchanged.
    pub fn new(identity: &str, payload: &str) -> Result<Self, ParseError> {
        check_field("identity", identity, &[BEL, '\x1b', ':'])?;
        check_field("payload", payload, &[BEL, '\x1b'])?;
        Ok(Self {
            identity: identity.to_string(),
            payload: payload.to_string(),
        })
    }
}

fn check_field(field: &'static str, value: &str, forbidden: &[char]) -> Result<(), ParseError> {
    match value.chars().find(|c| forbidden.contains(c)) {
        Some(found) => Err(ParseError::InvalidField { field, found }),
        None => Ok(()),
    }
}

impl fmt::Display for CustomEscape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{OSC_PREFIX}{}:{}{BEL}", self.identity, self.payload)
    }
}

impl FromStr for CustomEscape {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s
            .strip_prefix(OSC_PREFIX)
            .ok_or(ParseError::NotCustomSequence)?;
        let body = body
            .strip_suffix(BEL)
            .or_else(|| body.strip_suffix(ST))
            .ok_or(ParseError::MissingTerminator)?;
        // Identity ends at the first colon; the payload may contain more.
        let (identity, payload) = body.split_once(':').ok_or(ParseError::MissingSeparator)?;
        Self::new(identity, payload)
    }
}
