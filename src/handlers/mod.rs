//! Handler builders and associated traits.
//!
//! Provides a minimal builder API for constructing handlers in a type-safe
//! manner. Each builder implements [`HandlerBuilderTrait`], validating its
//! options before the handler opens any sockets.

use std::io;

use thiserror::Error;

pub mod udp_builder;

pub use udp_builder::UdpSenderBuilder;

/// Errors that may occur while building a handler.
#[derive(Debug, Error)]
pub enum HandlerBuildError {
    /// Invalid user supplied configuration.
    #[error("invalid handler configuration: {0}")]
    InvalidConfig(String),
    /// Underlying I/O error whilst creating the handler.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Trait implemented by all handler builders.
pub trait HandlerBuilderTrait: Send + Sync {
    /// Concrete handler produced by the builder.
    type Handler;

    /// Validate the options and build the handler instance.
    fn build_inner(&self) -> Result<Self::Handler, HandlerBuildError>;
}
