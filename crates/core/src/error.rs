/// Errors surfaced by a patient view.
///
/// None of these are fatal to the process; each is contained to the view that produced it.
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The repository has no record for the identifier. Terminal for the view.
    #[error("patient not found: {0}")]
    NotFound(String),

    /// Network or storage failure while fetching. Recoverable by navigating again.
    #[error("failed to fetch patient {id}: {source}")]
    TransientFetch {
        id: String,
        #[source]
        source: crate::repositories::RepositoryError,
    },

    /// A stored field could not be interpreted. The affected derived values are left blank.
    #[error("malformed record {id}: {reason}")]
    MalformedRecord { id: String, reason: String },
}

pub type ViewResult<T> = std::result::Result<T, ViewError>;
