//! Entity extractors: pure functions from raw transcript text to structured
//! values, or an `ExtractError` that cancels the action being assembled.

pub mod contact;
pub mod datetime;
pub mod email;

pub use contact::{ContactResolution, ContactResolver, PhoneDigits};
pub use datetime::{parse_relative, NaturalDateNormalizer, TIMESTAMP_FORMAT};
pub use email::{spell_email, spell_email_from_text, EmailAddress};
