use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while expanding and resolving user supplied paths.
#[derive(Error, Diagnostic, Debug)]
pub enum PathError {
    #[error("Failed to get current directory: {source}")]
    #[diagnostic(code(aurq_utils::current_dir))]
    CurrentDir {
        #[source]
        source: std::io::Error,
    },

    #[error("Path is empty")]
    #[diagnostic(code(aurq_utils::empty_path), help("Provide a non-empty path"))]
    Empty,

    #[error("Environment variable `{var}` not set in `{input}`")]
    #[diagnostic(
        code(aurq_utils::missing_env_var),
        help("Export the variable or use an absolute path instead")
    )]
    MissingEnvVar { var: String, input: String },

    #[error("Unclosed variable expression starting at `{input}`")]
    #[diagnostic(code(aurq_utils::unclosed_variable), help("Add the closing `}}`"))]
    UnclosedVariable { input: String },
}

pub type PathResult<T> = std::result::Result<T, PathError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_error_display() {
        assert_eq!(PathError::Empty.to_string(), "Path is empty");

        let err = PathError::MissingEnvVar {
            var: "FOO".into(),
            input: "$FOO/bar".into(),
        };
        assert_eq!(
            err.to_string(),
            "Environment variable `FOO` not set in `$FOO/bar`"
        );

        let err = PathError::UnclosedVariable {
            input: "${FOO".into(),
        };
        assert_eq!(
            err.to_string(),
            "Unclosed variable expression starting at `${FOO`"
        );
    }

    #[test]
    fn test_current_dir_source() {
        let err = PathError::CurrentDir {
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(std::error::Error::source(&err).is_some());
    }
}
