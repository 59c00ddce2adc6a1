use regex::Regex;

use super::types::{Intent, IntentKind};

/// Rule predicate. All checks are case-insensitive substring containment
/// against the whole transcript, never token-exact.
#[derive(Debug, Clone)]
pub enum Predicate {
    AnyOf(Vec<&'static str>),
    AllOf(Vec<&'static str>),
}

impl Predicate {
    pub fn matches(&self, transcript: &str) -> bool {
        match self {
            Predicate::AnyOf(phrases) => phrases.iter().any(|p| transcript.contains(p)),
            Predicate::AllOf(phrases) => phrases.iter().all(|p| transcript.contains(p)),
        }
    }
}

/// How the residual text of a rule is derived.
#[derive(Debug, Clone)]
pub enum Residual {
    /// The intent carries no payload.
    Empty,
    /// The listed trigger phrases are removed; what remains is the payload.
    Strip(Regex),
    /// The full transcript is the payload.
    Transcript,
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub kind: IntentKind,
    pub predicate: Predicate,
    pub residual: Residual,
}

impl Rule {
    fn new(kind: IntentKind, predicate: Predicate, residual: Residual) -> Self {
        Self { kind, predicate, residual }
    }
}

/// Ordered rule list. Evaluated top to bottom, first match wins.
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// The assistant's command grammar, highest priority first.
    pub fn standard() -> Result<Self, regex::Error> {
        use IntentKind::*;
        use Predicate::*;

        let rules = vec![
            Rule::new(
                Quit,
                AnyOf(vec!["goodbye", "good bye", "exit", "quit", "stop listening"]),
                Residual::Empty,
            ),
            Rule::new(
                ShutdownMac,
                // Bare "shut down" is enough; the gate asks before acting.
                AnyOf(vec!["shut down", "shutdown", "power off"]),
                Residual::Empty,
            ),
            Rule::new(
                SendEmail,
                AnyOf(vec!["send email", "send an email", "send a email"]),
                strip(&["send an email", "send a email", "send email", "to"])?,
            ),
            Rule::new(
                SetReminder,
                AnyOf(vec!["remind me", "set a reminder", "set reminder", "create a reminder"]),
                strip(&[
                    "set a reminder to",
                    "set a reminder for",
                    "set a reminder",
                    "set reminder",
                    "create a reminder",
                    "remind me to",
                    "remind me about",
                    "remind me",
                ])?,
            ),
            Rule::new(
                CreateCalendarEvent,
                AnyOf(vec![
                    "add to calendar",
                    "add to my calendar",
                    "calendar event",
                    "create event",
                    "create an event",
                    "schedule a meeting",
                    "schedule an event",
                ]),
                strip(&[
                    "add to my calendar",
                    "add to calendar",
                    "create a calendar event",
                    "calendar event",
                    "create an event",
                    "create event",
                    "schedule a meeting",
                    "schedule an event",
                    "called",
                    "for",
                ])?,
            ),
            Rule::new(
                SendMessage,
                AnyOf(vec!["send a message", "send message", "message", "text"]),
                Residual::Transcript,
            ),
            Rule::new(PlaceCall, AnyOf(vec!["facetime", "call"]), Residual::Transcript),
            Rule::new(
                OpenWebsite,
                AllOf(vec!["open", "in safari"]),
                strip(&["open up", "open", "in safari", "website"])?,
            ),
            Rule::new(OpenApp, AnyOf(vec!["open"]), strip(&["open up", "open", "the app", "app"])?),
            Rule::new(
                SearchWeb,
                AnyOf(vec!["search"]),
                strip(&["search the web for", "search google for", "search for", "search"])?,
            ),
            Rule::new(QueryTemperature, AnyOf(vec!["temperature"]), Residual::Empty),
            Rule::new(QueryHumidity, AnyOf(vec!["humidity", "humid"]), Residual::Empty),
            // Real-time info heuristics route the whole question to the search backend.
            Rule::new(
                SearchWeb,
                AnyOf(vec!["news", "update", "latest", "who", "what", "where", "how"]),
                Residual::Transcript,
            ),
        ];

        Ok(Self::new(rules))
    }
}

/// Builds a case-insensitive, word-bounded alternation over `phrases`.
/// Longer phrases are tried first so "send an email" wins over "send email".
fn strip(phrases: &[&str]) -> Result<Residual, regex::Error> {
    let mut sorted: Vec<&str> = phrases.to_vec();
    sorted.sort_by(|a, b| b.len().cmp(&a.len()));
    let alternation = sorted
        .iter()
        .map(|p| regex::escape(p))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternation)).map(Residual::Strip)
}

/// Collapses whitespace and trims stray punctuation left behind by trigger removal.
fn tidy(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c == ',' || c == '.' || c == '?' || c == '!' || c.is_whitespace())
        .to_string()
}

/// Maps a transcript to one intent plus residual text.
pub struct IntentClassifier {
    table: RuleTable,
}

impl IntentClassifier {
    pub fn new(table: RuleTable) -> Self {
        Self { table }
    }

    pub fn standard() -> Result<Self, regex::Error> {
        Ok(Self::new(RuleTable::standard()?))
    }

    /// Pure function: Transcript -> (Intent, residual).
    /// Never fails; no matching rule is the GeneralQuery path.
    pub fn classify(&self, transcript: &str) -> (Intent, String) {
        let lowered = transcript.trim().to_lowercase();

        for rule in self.table.rules() {
            if !rule.predicate.matches(&lowered) {
                continue;
            }
            let residual = match &rule.residual {
                Residual::Empty => String::new(),
                Residual::Strip(pattern) => tidy(&pattern.replace_all(&lowered, " ")),
                Residual::Transcript => lowered.clone(),
            };
            return (Intent::from_parts(rule.kind, &residual, &lowered), residual);
        }

        (
            Intent::from_parts(IntentKind::GeneralQuery, &lowered, &lowered),
            lowered,
        )
    }
}
