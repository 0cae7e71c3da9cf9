/// Validate a required text field with a max length.
pub fn validate_required(value: &str, field_name: &str, max_len: usize) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Some(format!("{field_name} is required"));
    }
    if trimmed.chars().count() > max_len {
        return Some(format!("{field_name} must be at most {max_len} characters"));
    }
    None
}

/// Validate an optional text field with a max length (empty is OK).
pub fn validate_optional(value: &str, field_name: &str, max_len: usize) -> Option<String> {
    let trimmed = value.trim();
    if !trimmed.is_empty() && trimmed.chars().count() > max_len {
        return Some(format!("{field_name} must be at most {max_len} characters"));
    }
    None
}

/// Validate free text (untrimmed) against a character limit.
pub fn validate_max_chars(value: &str, field_name: &str, max_len: usize) -> Option<String> {
    if value.chars().count() > max_len {
        return Some(format!("{field_name} must be at most {max_len} characters"));
    }
    None
}

/// Validate an identifier: 1-64 chars of letters, digits, '-' or '_'.
pub fn validate_identifier(value: &str, field_name: &str) -> Option<String> {
    if value.is_empty() {
        return Some(format!("{field_name} is required"));
    }
    if value.len() > 64 {
        return Some(format!("{field_name} must be at most 64 characters"));
    }
    if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Some(format!("{field_name} may only contain letters, numbers, '-' and '_'"));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_trims_and_limits() {
        assert!(validate_required("  ", "Title", 10).is_some());
        assert!(validate_required("ok", "Title", 10).is_none());
        assert!(validate_required("abcdefghijk", "Title", 10).is_some());
    }

    #[test]
    fn limits_count_characters_not_bytes() {
        assert!(validate_max_chars("ñññ", "Budget", 3).is_none());
        assert!(validate_optional("", "Agency", 3).is_none());
    }

    #[test]
    fn identifiers() {
        assert!(validate_identifier("E-1", "Evaluator id").is_none());
        assert!(validate_identifier("E 1", "Evaluator id").is_some());
        assert!(validate_identifier("", "Evaluator id").is_some());
    }
}
