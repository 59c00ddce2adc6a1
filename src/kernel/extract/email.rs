use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ExtractError;

/// Spoken words that stand for a single character of an address.
const SYNONYMS: &[(&str, &str)] = &[
    ("zero", "0"),
    ("one", "1"),
    ("two", "2"),
    ("three", "3"),
    ("four", "4"),
    ("five", "5"),
    ("six", "6"),
    ("seven", "7"),
    ("eight", "8"),
    ("nine", "9"),
    ("dot", "."),
    ("period", "."),
    ("dash", "-"),
    ("hyphen", "-"),
    ("minus", "-"),
    ("underscore", "_"),
    ("plus", "+"),
];

/// Providers the assistant accepts after a spoken "at".
const DOMAIN_ALIASES: &[(&str, &str)] = &[
    ("gmail", "@gmail.com"),
    ("yahoo", "@yahoo.com"),
    ("icloud", "@icloud.com"),
    ("outlook", "@outlook.com"),
    ("hotmail", "@hotmail.com"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailAddress {
    pub local: String,
    /// Everything from the '@' on, e.g. "@gmail.com".
    pub domain: String,
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.local, self.domain)
    }
}

fn normalize_token(token: &str) -> &str {
    SYNONYMS
        .iter()
        .find(|(word, _)| *word == token)
        .map(|(_, value)| *value)
        .unwrap_or(token)
}

fn lookup_domain(word: &str) -> Option<&'static str> {
    let word = word.trim_end_matches(".com");
    DOMAIN_ALIASES
        .iter()
        .find(|(alias, _)| *alias == word)
        .map(|(_, suffix)| *suffix)
}

/// Pure function: spelled tokens -> EmailAddress.
///
/// Tokens are consumed left to right. "at <alias>" ends the scan; an unknown
/// alias fails straight away with no partial result.
pub fn spell_email<S: AsRef<str>>(tokens: &[S]) -> Result<EmailAddress, ExtractError> {
    let mut local = String::new();
    let mut iter = tokens
        .iter()
        .map(|t| t.as_ref().trim().to_lowercase())
        .filter(|t| !t.is_empty());

    while let Some(token) = iter.next() {
        if token == "at" {
            if let Some(next) = iter.next() {
                let Some(suffix) = lookup_domain(&next) else {
                    return Err(ExtractError::DomainNotRecognized(next));
                };
                if local.is_empty() {
                    return Err(ExtractError::EmptyLocalPart);
                }
                return Ok(EmailAddress {
                    local,
                    domain: suffix.to_string(),
                });
            }
        }
        local.push_str(normalize_token(&token));
    }

    // No "at <domain>": only a literal '@' makes the text a complete address.
    match local.find('@') {
        Some(0) => Err(ExtractError::EmptyLocalPart),
        Some(at) if at + 1 < local.len() => {
            let domain = local.split_off(at);
            Ok(EmailAddress { local, domain })
        }
        _ => Err(ExtractError::NoDomain),
    }
}

/// Convenience wrapper splitting a transcript on whitespace.
pub fn spell_email_from_text(text: &str) -> Result<EmailAddress, ExtractError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    spell_email(&tokens)
}
