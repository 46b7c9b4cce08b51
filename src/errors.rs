//! # Error Types Module
//!
//! This module defines the error types used by the AI collaborators, the recipe
//! capture flow and the grocery list pipeline.

/// Errors raised while talking to the generative model
#[derive(Debug, Clone, PartialEq)]
pub enum AiError {
    /// Missing or invalid configuration (API key, project id)
    Configuration(String),
    /// Transport-level failure
    Network(String),
    /// Non-success HTTP status from the model endpoint
    Api { status: u16, message: String },
    /// The model answered without any text
    EmptyResponse,
    /// No JSON structure could be located in the model text
    NoJsonFound,
    /// A JSON candidate was found but did not parse into the expected shape
    InvalidJson(String),
    /// The call exceeded the configured timeout
    Timeout(u64),
    /// The circuit breaker is open after repeated failures
    CircuitOpen,
}

impl AiError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            AiError::Network(_) | AiError::Timeout(_) | AiError::EmptyResponse => true,
            AiError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl std::fmt::Display for AiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AiError::Configuration(msg) => write!(f, "Configuration error: {msg}"),
            AiError::Network(msg) => write!(f, "Network error: {msg}"),
            AiError::Api { status, message } => write!(f, "API error {status}: {message}"),
            AiError::EmptyResponse => write!(f, "The model returned an empty response"),
            AiError::NoJsonFound => write!(f, "No JSON structure found in the model response"),
            AiError::InvalidJson(msg) => write!(f, "Invalid JSON in model response: {msg}"),
            AiError::Timeout(secs) => write!(f, "Model call timed out after {secs}s"),
            AiError::CircuitOpen => write!(f, "Model calls are temporarily suspended"),
        }
    }
}

impl std::error::Error for AiError {}

// Request URLs are dropped from the error text
impl From<reqwest::Error> for AiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AiError::Timeout(0)
        } else {
            AiError::Network(err.without_url().to_string())
        }
    }
}

impl From<serde_json::Error> for AiError {
    fn from(err: serde_json::Error) -> Self {
        AiError::InvalidJson(err.to_string())
    }
}

/// Errors that abort a recipe capture
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureError {
    /// Nothing to capture
    EmptyInput,
    /// The model call or response extraction failed
    Ai(AiError),
    /// The model answered with JSON that is not a usable recipe
    IncompleteRecipe(String),
}

impl std::fmt::Display for CaptureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureError::EmptyInput => write!(f, "Nothing to capture"),
            CaptureError::Ai(err) => write!(f, "Recipe capture failed: {err}"),
            CaptureError::IncompleteRecipe(msg) => write!(f, "Incomplete recipe: {msg}"),
        }
    }
}

impl std::error::Error for CaptureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CaptureError::Ai(err) => Some(err),
            _ => None,
        }
    }
}

impl From<AiError> for CaptureError {
    fn from(err: AiError) -> Self {
        CaptureError::Ai(err)
    }
}

/// Input errors that stop grocery list generation before any network call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroceryError {
    /// No date range was selected
    NoDateRange,
    /// The selected range contains no planned meals
    NoMealsInRange,
    /// A generation for the same chat is still categorizing
    AlreadyGenerating,
}

impl GroceryError {
    /// Localization key of the user-visible message
    pub fn message_key(&self) -> &'static str {
        match self {
            GroceryError::NoDateRange => "grocery-no-range",
            GroceryError::NoMealsInRange => "grocery-no-meals",
            GroceryError::AlreadyGenerating => "grocery-already-generating",
        }
    }
}

impl std::fmt::Display for GroceryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroceryError::NoDateRange => write!(f, "Please select a date range"),
            GroceryError::NoMealsInRange => {
                write!(f, "No meals planned in the selected date range")
            }
            GroceryError::AlreadyGenerating => {
                write!(f, "A grocery list is already being generated")
            }
        }
    }
}

impl std::error::Error for GroceryError {}
