//! Error types for sift

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A mapping mutation was given an empty or blank canonical name.
    /// Checked before any table is touched.
    #[error("Invalid merge target: {0:?}")]
    InvalidMergeTarget(String),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
