use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransformError {
    /// The compiler's own ignore rules exclude the file, so it can be
    /// neither compiled nor fingerprinted.
    #[error(
        "babel-jest: Babel ignores {path} - make sure to include the file in Jest's transformIgnorePatterns as well."
    )]
    Ignored { path: String },

    /// Anything the compiler reports is passed through untouched.
    #[error(transparent)]
    Compiler(#[from] anyhow::Error),

    #[error("serde-json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TransformError>;
