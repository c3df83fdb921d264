//! Console-specific error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("failed to launch {binary}: {message}")]
    Launch { binary: String, message: String },

    #[error("network error talking to {endpoint}: {message}")]
    Network { endpoint: String, message: String },

    #[error("malformed response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    #[error("validation failed: {message}")]
    Validation { message: String },

    #[error("external tool {tool} failed: {message}")]
    ExternalTool { tool: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConsoleError {
    pub fn launch(binary: impl Into<String>, message: impl ToString) -> Self {
        Self::Launch {
            binary: binary.into(),
            message: message.to_string(),
        }
    }

    pub fn network(endpoint: impl Into<String>, message: impl ToString) -> Self {
        Self::Network {
            endpoint: endpoint.into(),
            message: message.to_string(),
        }
    }

    pub fn decode(endpoint: impl Into<String>, message: impl ToString) -> Self {
        Self::Decode {
            endpoint: endpoint.into(),
            message: message.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn external_tool(tool: impl Into<String>, message: impl ToString) -> Self {
        Self::ExternalTool {
            tool: tool.into(),
            message: message.to_string(),
        }
    }
}

pub type ConsoleResult<T> = Result<T, ConsoleError>;
