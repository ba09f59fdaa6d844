//! Plaza community data source
//!
//! Client for the remote service that feeds the plaza: an XML topic feed of
//! communities, each with an icon blob and the people (and their avatar
//! descriptor blobs) gathered around it.

pub mod client;
pub mod decoder;
pub mod types;

pub use client::PlazaClient;
pub use decoder::{DescriptorDecoder, SeededDecoder};
pub use types::{CommunityRecord, PersonRecord};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlazaError {
    #[error("feed request failed: {reason}")]
    Transport { reason: String },

    #[error("feed decode failed: {reason}")]
    Feed { reason: String },

    #[error("blob decode failed: {reason}")]
    Encoding { reason: String },

    #[error("descriptor decode failed: {reason}")]
    Descriptor { reason: String },

    #[error("no plaza data after {attempts} attempts")]
    DataUnavailable { attempts: u32 },
}

pub type PlazaResult<T> = Result<T, PlazaError>;

impl From<reqwest::Error> for PlazaError {
    fn from(err: reqwest::Error) -> Self {
        PlazaError::Transport { reason: err.to_string() }
    }
}
