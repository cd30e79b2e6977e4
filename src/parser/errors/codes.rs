//! Diagnostic codes
//!
//! `E01xx` lexical, `E02xx` unexpected or missing tokens, `E03xx` recovery.

use std::fmt;

/// Which stage of the parse a code belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorFamily {
    /// Text no terminal of the language matches
    Lexical,
    /// A token in the wrong place, or one the parser had to invent
    Token,
    /// Input the parser gave up on to resynchronize
    Recovery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum ErrorCode {
    /// Characters no token matches
    E0101 = 101,
    /// A string literal that never closes
    E0102 = 102,
    /// A token the grammar has no place for
    E0201 = 201,
    /// MISSING `}`
    E0202 = 202,
    /// MISSING `)`
    E0203 = 203,
    /// MISSING `]`
    E0204 = 204,
    /// MISSING punctuation or keyword
    E0205 = 205,
    /// MISSING token at end of input
    E0206 = 206,
    /// MISSING word token (identifier)
    E0301 = 301,
    /// MISSING named token other than the word token
    E0302 = 302,
    /// ERROR node holding partially reduced syntax
    E0303 = 303,
}

impl ErrorCode {
    pub fn family(self) -> ErrorFamily {
        match self as u16 / 100 {
            1 => ErrorFamily::Lexical,
            2 => ErrorFamily::Token,
            _ => ErrorFamily::Recovery,
        }
    }

    /// The code reported when a closing delimiter is MISSING, with the
    /// matching opener and a noun for messages.
    pub fn for_closer(closer: &str) -> Option<(Self, &'static str, &'static str)> {
        match closer {
            "}" => Some((Self::E0202, "{", "brace")),
            ")" => Some((Self::E0203, "(", "parenthesis")),
            "]" => Some((Self::E0204, "[", "bracket")),
            _ => None,
        }
    }

    /// An unclosed delimiter
    pub fn is_unclosed(self) -> bool {
        matches!(self, Self::E0202 | Self::E0203 | Self::E0204)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", *self as u16)
    }
}
