use thiserror::Error;

/// Failure reported by a remote recipe source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Couldn't reach server. Check your internet connection.")]
    Unreachable(String),

    #[error("Server error: {0}")]
    ServerError(u16),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("Couldn't save recipe {id} to favourites: {reason}")]
    PersistenceInsertFailed { id: i64, reason: String },

    #[error("Couldn't remove recipe {id} from favourites: {reason}")]
    PersistenceDeleteFailed { id: i64, reason: String },

    #[error("Couldn't load favourites: {reason}")]
    PersistenceReadFailed { reason: String },

    /// A newer request for the same list was issued; never shown to the user.
    #[error("fetch generation {0} was superseded")]
    SupersededFetch(u64),
}

impl SyncError {
    pub(crate) fn read_failed(err: &anyhow::Error) -> Self {
        SyncError::PersistenceReadFailed {
            reason: format!("{err:#}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let e: SyncError = NetworkError::ServerError(402).into();
        assert_eq!(e.to_string(), "Server error: 402");

        let e = SyncError::from(NetworkError::Unreachable("dns".to_string()));
        assert_eq!(
            e.to_string(),
            "Couldn't reach server. Check your internet connection."
        );

        let e = SyncError::PersistenceDeleteFailed {
            id: 5,
            reason: "disk I/O error".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "Couldn't remove recipe 5 from favourites: disk I/O error"
        );
    }
}
