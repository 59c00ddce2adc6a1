use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ExtractError;
use crate::services::ContactDirectory;

/// A phone number reduced to its digits. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhoneDigits(String);

impl PhoneDigits {
    /// Keeps only ASCII digits; `None` when nothing is left.
    pub fn from_text(text: &str) -> Option<Self> {
        let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            None
        } else {
            Some(Self(digits))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneDigits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of resolving a spoken recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactResolution {
    /// Directory name on a hit, otherwise the candidate text as spoken.
    pub display_name: String,
    pub phone: PhoneDigits,
    pub from_directory: bool,
}

/// Leading trigger phrases removed before lookup. Applied repeatedly so
/// "send message to mom" and "text to mom" both reduce to "mom".
const LEADING_TRIGGERS: &str =
    r"(?i)^(?:\s*(?:send (?:a )?message to|send (?:a )?message|message|text|facetime|call|to)\b)+";

pub struct ContactResolver {
    leading: Regex,
}

impl ContactResolver {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            leading: Regex::new(LEADING_TRIGGERS)?,
        })
    }

    /// Pure function: command -> candidate name/number with triggers removed.
    pub fn candidate(&self, command: &str) -> String {
        self.leading
            .replace(command.trim(), "")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Directory first (first substring match wins), then the digits spoken in
    /// the command itself.
    pub fn resolve(
        &self,
        command: &str,
        directory: &dyn ContactDirectory,
    ) -> Result<ContactResolution, ExtractError> {
        let candidate = self.candidate(command);

        if let Some(contact) = directory.lookup(&candidate) {
            if let Some(phone) = PhoneDigits::from_text(&contact.phone) {
                return Ok(ContactResolution {
                    display_name: contact.name,
                    phone,
                    from_directory: true,
                });
            }
        }

        PhoneDigits::from_text(&candidate)
            .map(|phone| ContactResolution {
                display_name: candidate.clone(),
                phone,
                from_directory: false,
            })
            .ok_or(ExtractError::NoDigitsFound)
    }
}
