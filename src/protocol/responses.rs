//! FTP Response handling
//!
//! Defines FTP response codes and the reply line format.

use std::fmt;

/// Standard FTP response codes
pub const DATA_CONNECTION_OPENING: u16 = 150;
pub const READY: u16 = 220;
pub const GOODBYE: u16 = 221;
pub const TRANSFER_COMPLETE: u16 = 226;
pub const ENTERING_PASSIVE_MODE: u16 = 227;
pub const LOGIN_SUCCESS: u16 = 230;
pub const ACTION_OK: u16 = 250;
pub const PATH_CREATED: u16 = 257;
pub const PASSWORD_REQUIRED: u16 = 331;
pub const SERVICE_UNAVAILABLE: u16 = 421;
pub const CANNOT_OPEN_DATA_CONNECTION: u16 = 425;
pub const TRANSFER_ABORTED: u16 = 426;
pub const SYNTAX_ERROR: u16 = 500;
pub const PARAMETER_ERROR: u16 = 501;
pub const NOT_LOGGED_IN: u16 = 530;
pub const FILE_UNAVAILABLE: u16 = 550;

/// A single reply line: three-digit code plus human-readable text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub code: u16,
    pub text: String,
}

impl Reply {
    pub fn new(code: u16, text: impl Into<String>) -> Self {
        Self {
            code,
            text: text.into(),
        }
    }

    pub fn not_logged_in() -> Self {
        Self::new(NOT_LOGGED_IN, "Not logged in.")
    }

    pub fn not_allowed() -> Self {
        Self::new(NOT_LOGGED_IN, "Not allowed.")
    }

    /// 1xx
    pub fn is_preliminary(&self) -> bool {
        (100..200).contains(&self.code)
    }

    /// 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code)
    }

    /// 3xx
    pub fn needs_more_input(&self) -> bool {
        (300..400).contains(&self.code)
    }

    /// 4xx and 5xx
    pub fn is_rejection(&self) -> bool {
        (400..600).contains(&self.code)
    }

    /// Serializes the reply with its CRLF terminator.
    pub fn to_wire(&self) -> String {
        format_response(self.code, &self.text)
    }

    /// Parses a reply line as sent by [`Reply::to_wire`]. Returns `None` when
    /// the line does not start with a three-digit code.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let digits = line.get(..3)?;
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let code = digits.parse().ok()?;
        let text = line
            .get(3..)
            .map(|rest| rest.strip_prefix([' ', '-']).unwrap_or(rest))
            .unwrap_or("");
        Some(Self::new(code, text))
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.text)
    }
}

/// Format an FTP response message
pub fn format_response(code: u16, message: &str) -> String {
    format!("{} {}\r\n", code, message)
}
