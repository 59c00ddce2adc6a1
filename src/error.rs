use thiserror::Error;

/// Failures produced by the entity extractors.
///
/// These are local and recoverable: they cancel only the action that was being
/// assembled and the session returns to idle with a spoken explanation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// "at" was followed by a word that is not in the domain alias table.
    #[error("email domain '{0}' is not recognized")]
    DomainNotRecognized(String),

    /// No "at <domain>" pair and no literal '@' in the spelled text.
    #[error("email address has no domain")]
    NoDomain,

    /// A recognized domain with nothing spelled before it.
    #[error("email address has no local part")]
    EmptyLocalPart,

    /// Neither the directory nor the command text produced a digit.
    #[error("no phone digits could be resolved")]
    NoDigitsFound,

    /// The date normalizer returned nothing for the spoken text.
    #[error("could not understand the date '{0}'")]
    DateUnparseable(String),
}

impl ExtractError {
    /// Spoken explanation used when the failure cancels an action.
    pub fn spoken(&self) -> String {
        match self {
            ExtractError::DomainNotRecognized(domain) => format!(
                "I don't recognize the email provider {}. Cancelling the email.",
                domain
            ),
            ExtractError::NoDomain | ExtractError::EmptyLocalPart => {
                "I couldn't build a complete email address. Cancelling the email.".to_string()
            }
            ExtractError::NoDigitsFound => {
                "I couldn't find a phone number for that contact.".to_string()
            }
            ExtractError::DateUnparseable(_) => {
                "I couldn't understand that date, so I cancelled it.".to_string()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfirmationError {
    #[error("a confirmation prompt is already pending")]
    AlreadyPending,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("missing required setting: {0}")]
    Missing(&'static str),
}

/// Top-level errors. Only startup and shutdown paths surface these; everything
/// inside a conversation turn degrades to a spoken fallback instead.
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("wake word detection failed: {0}")]
    WakeWord(String),

    #[error("hardware channel error: {0}")]
    Hardware(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AssistantError>;
