use std::fmt::Display;

pub trait ResultExt<T, E> {
    /// Replace the error with a variant built from its display string
    ///
    /// # Example
    /// ```rust
    /// use qrcheck_util::result_ext::ResultExt as _;
    ///
    /// #[derive(Debug, PartialEq, thiserror::Error)]
    /// enum ConfigError {
    ///     #[error("unable to parse config: {0}")]
    ///     Parse(String),
    /// }
    ///
    /// let result: Result<u64, ConfigError> = "ten".parse::<u64>().map_err_str(ConfigError::Parse);
    /// assert_eq!(result, Err(ConfigError::Parse("invalid digit found in string".to_string())));
    /// ```
    fn map_err_str<F, O>(self, f: F) -> Result<T, O>
    where
        E: Display,
        F: FnOnce(String) -> O;
}

impl<T, E> ResultExt<T, E> for Result<T, E> {
    fn map_err_str<F, O>(self, f: F) -> Result<T, O>
    where
        E: Display,
        F: FnOnce(String) -> O,
    {
        self.map_err(|error| f(error.to_string()))
    }
}
