//! Error types for the multiselect core primitives.

/// Errors produced by the core primitives.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The worker thread could not be started, or its name is invalid.
    #[error("Failed to spawn worker thread '{name}': {source}")]
    WorkerSpawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// The worker has been stopped and no longer accepts requests.
    #[error("Worker '{0}' has been stopped")]
    WorkerStopped(String),

    /// The worker's request channel is at capacity.
    #[error("Worker '{name}' request queue is full (capacity {capacity})")]
    QueueFull { name: String, capacity: usize },
}

impl CoreError {
    /// Create a spawn error.
    pub fn spawn(name: impl Into<String>, source: std::io::Error) -> Self {
        Self::WorkerSpawn {
            name: name.into(),
            source,
        }
    }
}

/// A specialized Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::QueueFull {
            name: "filter".into(),
            capacity: 8,
        };
        assert_eq!(
            err.to_string(),
            "Worker 'filter' request queue is full (capacity 8)"
        );

        let err = CoreError::spawn("filter", std::io::Error::other("no threads"));
        assert!(err.to_string().contains("no threads"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
