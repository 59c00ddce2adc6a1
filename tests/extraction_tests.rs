mod common;

use jarvis::error::ExtractError;
use jarvis::kernel::extract::{
    parse_relative, spell_email, spell_email_from_text, ContactResolver, NaturalDateNormalizer,
};
use jarvis::services::DateNormalizer;

// === EMAIL ===

#[test]
fn test_email_with_domain_alias() {
    let email = spell_email(&["j", "o", "h", "n", "at", "yahoo"]).unwrap();
    assert_eq!(email.to_string(), "john@yahoo.com");
}

#[test]
fn test_email_unknown_domain() {
    assert_eq!(
        spell_email(&["j", "o", "h", "n", "at", "rocketmail"]),
        Err(ExtractError::DomainNotRecognized("rocketmail".to_string()))
    );
}

#[test]
fn test_email_synonyms() {
    let email = spell_email_from_text("j dot smith underscore four two at gmail").unwrap();
    assert_eq!(email.to_string(), "j.smith_42@gmail.com");

    let email = spell_email_from_text("a dash b at icloud dot com").unwrap();
    assert_eq!(email.to_string(), "a-b@icloud.com");
}

#[test]
fn test_email_literal_at_sign() {
    let email = spell_email_from_text("me@example.org").unwrap();
    assert_eq!(email.local, "me");
    assert_eq!(email.domain, "@example.org");
}

#[test]
fn test_email_missing_parts() {
    assert_eq!(spell_email_from_text("j o h n"), Err(ExtractError::NoDomain));
    assert_eq!(spell_email_from_text("at gmail"), Err(ExtractError::EmptyLocalPart));
    assert_eq!(spell_email::<&str>(&[]), Err(ExtractError::NoDomain));
}

// === CONTACTS ===

#[test]
fn test_contact_from_directory() {
    let resolver = ContactResolver::new().unwrap();
    let directory = common::directory();

    let hit = resolver.resolve("call john", &directory).unwrap();
    assert_eq!(hit.phone.as_str(), "3033331111");
    assert_eq!(hit.display_name, "John");
    assert!(hit.from_directory);
}

#[test]
fn test_contact_from_spoken_digits() {
    let resolver = ContactResolver::new().unwrap();
    let directory = common::directory();

    let miss = resolver.resolve("call 303-333-1111", &directory).unwrap();
    assert_eq!(miss.phone.as_str(), "3033331111");
    assert!(!miss.from_directory);
}

#[test]
fn test_contact_trigger_stripping() {
    let resolver = ContactResolver::new().unwrap();
    assert_eq!(resolver.candidate("send message to Mom"), "Mom");
    assert_eq!(resolver.candidate("text to john"), "john");
    assert_eq!(resolver.candidate("facetime"), "");
}

#[test]
fn test_contact_without_digits_fails() {
    let resolver = ContactResolver::new().unwrap();
    assert_eq!(
        resolver.resolve("text stranger", &common::directory()),
        Err(ExtractError::NoDigitsFound)
    );
}

// === DATES ===

fn fmt(text: &str) -> Option<String> {
    NaturalDateNormalizer::with_clock(common::fixed_now()).normalize(text)
}

#[test]
fn test_dates_relative_days() {
    assert_eq!(fmt("tomorrow at 5 pm").as_deref(), Some("Saturday, March 16, 2024 at 5:00 PM"));
    assert_eq!(fmt("tomorrow").as_deref(), Some("Saturday, March 16, 2024 at 9:00 AM"));
    assert_eq!(fmt("tonight at 8").as_deref(), Some("Friday, March 15, 2024 at 8:00 PM"));
}

#[test]
fn test_dates_offsets_and_weekdays() {
    assert_eq!(fmt("in 30 minutes").as_deref(), Some("Friday, March 15, 2024 at 10:30 AM"));
    assert_eq!(fmt("in two days").as_deref(), Some("Sunday, March 17, 2024 at 10:00 AM"));
    assert_eq!(fmt("monday at 9:30 am").as_deref(), Some("Monday, March 18, 2024 at 9:30 AM"));
    // Today's weekday means next week.
    assert_eq!(fmt("next friday").as_deref(), Some("Friday, March 22, 2024 at 9:00 AM"));
}

#[test]
fn test_dates_bare_time_rolls_forward() {
    assert_eq!(fmt("at 3 pm").as_deref(), Some("Friday, March 15, 2024 at 3:00 PM"));
    assert_eq!(fmt("7 am").as_deref(), Some("Saturday, March 16, 2024 at 7:00 AM"));
}

#[test]
fn test_dates_iso_and_garbage() {
    let now = common::fixed_now();
    assert!(parse_relative("2024-04-01 14:15", now).is_some());
    assert_eq!(fmt("whenever"), None);
    assert_eq!(fmt(""), None);
    assert_eq!(fmt("tomorrow at lunchtime"), None);
}

#[test]
fn test_dates_huge_offsets_are_unparseable() {
    let now = common::fixed_now();
    assert_eq!(parse_relative("in 99999999999 days", now), None);
    assert_eq!(parse_relative("in 999999999999999 minutes", now), None);
    assert_eq!(parse_relative("in 9223372036854775807 weeks", now), None);
    assert_eq!(fmt("in 99999999999 hours"), None);
}
