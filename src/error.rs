// Copyright 2025 Jayashankar
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read {path}: {source}")]
    NotFound {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    WriteFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid private key: {reason} (pass phrase was {})", supplied(.passphrase_supplied))]
    InvalidKey {
        reason: String,
        passphrase_supplied: bool,
    },

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Key generation failed: {0}")]
    KeyGenFailed(String),

    #[error("CSR construction failed: {0}")]
    CsrBuildFailed(String),

    #[error("Certificate construction failed: {0}")]
    CertBuildFailed(String),

    #[error("Signing failed: {0}")]
    SignFailed(String),

    #[error("Encoding failed: {0}")]
    EncodeFailed(String),

    #[error("Input of {size} bytes exceeds the limit of {limit} bytes")]
    TooLarge { size: usize, limit: usize },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Unexpected content type '{0}', expected application/pkix-cert")]
    UnexpectedContentType(String),

    #[error("No domains specified")]
    NoDomains,

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

fn supplied(flag: &bool) -> &'static str {
    if *flag {
        "supplied"
    } else {
        "not supplied"
    }
}
