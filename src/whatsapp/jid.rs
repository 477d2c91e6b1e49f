//! WhatsApp addresses (JIDs).
//!
//! Accepts either a full `user[:device]@server` JID or a human-entered phone
//! number, which is normalised onto the default user server.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Server used for individual user accounts.
pub const DEFAULT_USER_SERVER: &str = "s.whatsapp.net";

/// Server used for group chats.
pub const GROUP_SERVER: &str = "g.us";

/// Characters people commonly type inside phone numbers.
const PHONE_SEPARATORS: &[char] = &[' ', '-', '.', '(', ')'];

/// Errors from parsing a [`Jid`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JidError {
    /// Input was empty or whitespace.
    #[error("address is empty")]
    Empty,

    /// More than one `@` separator.
    #[error("unexpected number of @ separators in {0:?}")]
    TooManySeparators(String),

    /// The user part of a full JID was empty.
    #[error("missing user part in {0:?}")]
    MissingUser(String),

    /// The server part of a full JID was empty.
    #[error("missing server part in {0:?}")]
    MissingServer(String),

    /// The device qualifier was not a valid number.
    #[error("invalid device qualifier in {0:?}")]
    InvalidDevice(String),

    /// A bare address was not a phone number.
    #[error("not a phone number: {0:?}")]
    NotAPhoneNumber(String),
}

/// A WhatsApp network identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Jid {
    /// User part (phone number or group id).
    pub user: String,
    /// Optional device qualifier for multi-device addressing.
    pub device: Option<u16>,
    /// Server part, e.g. `s.whatsapp.net` or `g.us`.
    pub server: String,
}

impl Jid {
    /// Build a user JID on the default server.
    pub fn user(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            device: None,
            server: DEFAULT_USER_SERVER.to_owned(),
        }
    }

    /// Whether this JID addresses a group chat.
    pub fn is_group(&self) -> bool {
        self.server == GROUP_SERVER
    }
}

impl FromStr for Jid {
    type Err = JidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        if input.is_empty() {
            return Err(JidError::Empty);
        }

        let mut parts = input.split('@');
        let head = parts.next().unwrap_or_default();
        let server = parts.next();
        if parts.next().is_some() {
            return Err(JidError::TooManySeparators(input.to_owned()));
        }

        let Some(server) = server else {
            return parse_phone_number(input);
        };
        if server.is_empty() {
            return Err(JidError::MissingServer(input.to_owned()));
        }

        let (user, device) = match head.split_once(':') {
            Some((user, device)) => {
                let device = device
                    .parse::<u16>()
                    .map_err(|_| JidError::InvalidDevice(input.to_owned()))?;
                (user, Some(device))
            }
            None => (head, None),
        };
        if user.is_empty() {
            return Err(JidError::MissingUser(input.to_owned()));
        }

        Ok(Self {
            user: user.to_owned(),
            device,
            server: server.to_owned(),
        })
    }
}

fn parse_phone_number(input: &str) -> Result<Jid, JidError> {
    let digits = input.strip_prefix('+').unwrap_or(input);
    let mut user = String::with_capacity(digits.len());
    for c in digits.chars() {
        if c.is_ascii_digit() {
            user.push(c);
        } else if !PHONE_SEPARATORS.contains(&c) {
            return Err(JidError::NotAPhoneNumber(input.to_owned()));
        }
    }
    if user.is_empty() {
        return Err(JidError::NotAPhoneNumber(input.to_owned()));
    }
    Ok(Jid::user(user))
}

impl fmt::Display for Jid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.device {
            Some(device) => write!(f, "{}:{device}@{}", self.user, self.server),
            None => write!(f, "{}@{}", self.user, self.server),
        }
    }
}

impl TryFrom<String> for Jid {
    type Error = JidError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Jid> for String {
    fn from(jid: Jid) -> Self {
        jid.to_string()
    }
}
