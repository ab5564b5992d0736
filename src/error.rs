use std::fmt;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Where in a backup run a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Connect,
    Introspect,
    Dump,
    Finalize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Connect => "connect",
            Stage::Introspect => "introspect",
            Stage::Dump => "dump",
            Stage::Finalize => "finalize",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("unsupported engine kind: {0}")]
    UnsupportedEngine(String),

    #[error("missing required setting: {0}")]
    MissingSetting(&'static str),

    #[error("table not found: {0}")]
    TableNotFound(String),

    #[error("{stage} failed{}: {source}", object_suffix(.object))]
    Stage {
        stage: Stage,
        object: Option<String>,
        #[source]
        source: BoxError,
    },
}

fn object_suffix(object: &Option<String>) -> String {
    match object {
        Some(name) => format!(" for `{}`", name),
        None => String::new(),
    }
}

impl BackupError {
    pub fn stage(&self) -> Option<Stage> {
        match self {
            BackupError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    pub fn object(&self) -> Option<&str> {
        match self {
            BackupError::Stage { object, .. } => object.as_deref(),
            BackupError::TableNotFound(name) => Some(name),
            _ => None,
        }
    }
}

/// Attach a run stage (and optionally the object being processed) to an error.
pub trait StageExt<T> {
    fn stage(self, stage: Stage) -> Result<T, BackupError>;
    fn stage_for(self, stage: Stage, object: &str) -> Result<T, BackupError>;
}

impl<T, E> StageExt<T> for Result<T, E>
where
    E: Into<BoxError>,
{
    fn stage(self, stage: Stage) -> Result<T, BackupError> {
        self.map_err(|e| BackupError::Stage {
            stage,
            object: None,
            source: e.into(),
        })
    }

    fn stage_for(self, stage: Stage, object: &str) -> Result<T, BackupError> {
        self.map_err(|e| BackupError::Stage {
            stage,
            object: Some(object.to_string()),
            source: e.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_error_message_includes_object() {
        let result: Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        let err = result.stage_for(Stage::Dump, "users").unwrap_err();
        assert_eq!(err.to_string(), "dump failed for `users`: denied");
        assert_eq!(err.stage(), Some(Stage::Dump));
        assert_eq!(err.object(), Some("users"));
    }

    #[test]
    fn test_stage_error_without_object() {
        let result: Result<(), anyhow::Error> = Err(anyhow::anyhow!("refused"));
        let err = result.stage(Stage::Connect).unwrap_err();
        assert_eq!(err.to_string(), "connect failed: refused");
        assert_eq!(err.object(), None);
    }
}
