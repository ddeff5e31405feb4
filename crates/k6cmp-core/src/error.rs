#[derive(Debug, thiserror::Error)]
pub enum K6cmpError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Output error: {0}")]
    Output(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_error_display() {
        let err = K6cmpError::Output("not a writable path".to_string());
        assert_eq!(err.to_string(), "Output error: not a writable path");
    }

    #[test]
    fn io_error_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: K6cmpError = io_err.into();
        let msg = err.to_string();
        assert!(msg.contains("IO error"));
        assert!(msg.contains("file not found"));
    }

    #[test]
    fn serde_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("not valid json").unwrap_err();
        let err: K6cmpError = json_err.into();
        assert!(err.to_string().contains("Serialization error"));
    }

    #[test]
    fn error_is_debug() {
        let err = K6cmpError::Output("test".to_string());
        let debug = format!("{:?}", err);
        assert!(debug.contains("Output"));
    }
}
