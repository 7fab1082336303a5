// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error types for the cutting pipeline
//!
//! Every error is fatal for the pipeline step that raised it. The only soft
//! condition (`cut()` without any interface) is reported through the log and
//! the returned [`crate::CutReport`], never through this type.

use std::fmt;
use thiserror::Error;

/// Result type for cutting operations
pub type Result<T> = std::result::Result<T, CutError>;

/// Entity an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    /// Background element by global id
    Element(usize),
    /// Cutter or level-set side by global id
    Side(usize),
    /// Volume cell: owning element global id and local cell index
    VolumeCell { element: usize, cell: usize },
    /// Background node by global id
    Node(usize),
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRef::Element(id) => write!(f, "element {id}"),
            EntityRef::Side(id) => write!(f, "side {id}"),
            EntityRef::VolumeCell { element, cell } => {
                write!(f, "volume cell {cell} of element {element}")
            }
            EntityRef::Node(id) => write!(f, "node {id}"),
        }
    }
}

/// Pipeline misuse
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("configure() called twice without reset()")]
    AlreadyConfigured,

    #[error("prepare() called before configure()")]
    NotConfigured,

    #[error("{operation} is not allowed in state {state}")]
    PipelineOrder {
        operation: &'static str,
        state: &'static str,
    },

    #[error("invalid option: {0}")]
    InvalidOption(String),
}

/// Errors that can occur while cutting
#[derive(Error, Debug)]
pub enum CutError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("geometry inconsistency at {entity}: {message}")]
    GeometryInconsistency { entity: EntityRef, message: String },

    #[error("communication mismatch: {0}")]
    CommunicationMismatch(String),

    #[error("failed to parse options: {0}")]
    Config(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CutError {
    /// Shorthand for a geometry inconsistency
    pub fn geometry(entity: EntityRef, message: impl Into<String>) -> Self {
        CutError::GeometryInconsistency {
            entity,
            message: message.into(),
        }
    }

    /// Shorthand for a pipeline-order violation
    pub fn order(operation: &'static str, state: &'static str) -> Self {
        CutError::Configuration(ConfigurationError::PipelineOrder { operation, state })
    }

    /// Whether this error is a configuration/pipeline error
    pub fn is_configuration(&self) -> bool {
        matches!(self, CutError::Configuration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_entity() {
        let err = CutError::geometry(
            EntityRef::VolumeCell { element: 12, cell: 1 },
            "non-positive volume -1e-3",
        );
        let text = err.to_string();
        assert!(text.contains("volume cell 1 of element 12"));
        assert!(text.contains("-1e-3"));
    }

    #[test]
    fn test_order_error_is_configuration() {
        let err = CutError::order("cut()", "Configured");
        assert!(err.is_configuration());
        assert!(err.to_string().contains("cut()"));
    }
}
