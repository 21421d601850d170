use serde::Serialize;
use thiserror::Error;

/// Validation step at which a postage calculation failed.
///
/// The tag is the whole contract; localized wording belongs to the caller.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationError {
    #[error("origin administration is not served")]
    Service,

    #[error("no rate table or zone for this route")]
    Route,

    #[error("mail type not offered on this route")]
    MailType,

    #[error("delivery category missing or not available")]
    MailCategory,

    #[error("weight outside the limits of the rate")]
    Weight,

    #[error("rate data produced no price")]
    Calculation,
}

impl CalculationError {
    pub fn kind(&self) -> &'static str {
        match self {
            CalculationError::Service => "service",
            CalculationError::Route => "route",
            CalculationError::MailType => "mail_type",
            CalculationError::MailCategory => "mail_category",
            CalculationError::Weight => "weight",
            CalculationError::Calculation => "calculation",
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Calculation failed: {0}")]
    Calculation(#[from] CalculationError),
}

pub type Result<T> = std::result::Result<T, Error>;
