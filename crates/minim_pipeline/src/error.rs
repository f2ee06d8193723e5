//! Build-level error types.

/// Errors that stop a build as a whole.
///
/// A single asset failing to minify is not one of these: it is reported as
/// an error diagnostic and the asset keeps its original content.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The build was aborted before results were written back.
    #[error("build aborted")]
    Aborted,

    /// A worker pool was requested with zero workers.
    #[error("worker pool needs at least one worker")]
    NoWorkers,

    /// The worker pool could not be started.
    #[error("failed to start worker pool: {0}")]
    PoolStart(String),

    /// The configuration was invalid.
    #[error(transparent)]
    Config(#[from] minim_config::ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(PipelineError::Aborted.to_string(), "build aborted");
        assert_eq!(
            PipelineError::NoWorkers.to_string(),
            "worker pool needs at least one worker"
        );
        assert_eq!(
            PipelineError::PoolStart("out of threads".into()).to_string(),
            "failed to start worker pool: out of threads"
        );
    }

    #[test]
    fn config_error_is_transparent() {
        let err: PipelineError =
            minim_config::ConfigError::ValidationError("bad rule".into()).into();
        assert_eq!(err.to_string(), "validation error: bad rule");
    }
}
