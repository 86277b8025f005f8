pub mod result_ext;

/// Treats an empty string the same as a missing one
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}
