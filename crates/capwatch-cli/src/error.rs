use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] capwatch_core::ValidationError),

    #[error(transparent)]
    Config(#[from] capwatch_core::ConfigError),

    #[error("command error: {0}")]
    Command(String),

    #[error(transparent)]
    Pipeline(#[from] capwatch_core::PipelineError),

    #[error("pipeline failed: {0}")]
    PipelineStatus(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::Config(_) | Self::Command(_) => 2,
            Self::Pipeline(_) | Self::PipelineStatus(_) => 3,
            Self::Serialization(_) => 4,
            Self::Io(_) => 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capwatch_core::{ConfigError, PipelineError, ValidationError};

    #[test]
    fn exit_codes_follow_error_category() {
        assert_eq!(CliError::from(ValidationError::ZeroPage).exit_code(), 2);
        assert_eq!(
            CliError::from(ConfigError::MissingApiKey { key: "K" }).exit_code(),
            2
        );
        assert_eq!(CliError::from(PipelineError::SessionClosed).exit_code(), 3);
        assert_eq!(
            CliError::from(std::io::Error::other("closed")).exit_code(),
            10
        );
    }
}
