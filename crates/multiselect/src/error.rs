use multiselect_core::CoreError;
use thiserror::Error;

/// Errors returned by construction-time APIs.
///
/// User interaction never fails: unknown values and disabled actions are
/// logged and ignored.
#[derive(Debug, Error)]
pub enum PaletteError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type Result<T> = std::result::Result<T, PaletteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversions() {
        let json = serde_json::from_str::<u32>("x").unwrap_err();
        let err: PaletteError = json.into();
        assert!(err.to_string().starts_with("Invalid JSON"));

        let err: PaletteError = CoreError::WorkerStopped("filter".into()).into();
        assert!(matches!(err, PaletteError::Core(_)));
    }
}
