use crate::{
    cli::errors::{CliError, CliResult},
    config::MAX_LIMIT,
};

const MAX_QUERY_CHARS: usize = 500;

/// Join the positional words of a query and check it is usable.
pub fn validate_query(words: &[String]) -> CliResult<String> {
    let query = words.join(" ").trim().to_string();

    if query.is_empty() {
        return Err(CliError::validation("query", "Query cannot be empty"));
    }

    if query.chars().count() > MAX_QUERY_CHARS {
        return Err(CliError::validation(
            "query",
            format!("Query cannot exceed {MAX_QUERY_CHARS} characters"),
        ));
    }

    Ok(query)
}

pub fn validate_limit(limit: usize) -> CliResult<usize> {
    if limit == 0 || limit > MAX_LIMIT {
        return Err(CliError::validation(
            "limit",
            format!("Limit must be between 1 and {MAX_LIMIT}"),
        ));
    }
    Ok(limit)
}

/// Empty or whitespace-only category means no filter.
pub fn normalize_category(category: Option<String>) -> Option<String> {
    category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

pub fn validate_meme_id(id: &str) -> CliResult<&str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(CliError::invalid_input("meme id cannot be empty"));
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(s: &[&str]) -> Vec<String> {
        s.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_validate_query_joins_words() {
        assert_eq!(validate_query(&words(&["可爱", "猫"])).unwrap(), "可爱 猫");
        assert_eq!(validate_query(&words(&["  cat "])).unwrap(), "cat");
    }

    #[test]
    fn test_validate_query_rejects_empty() {
        assert!(validate_query(&[]).is_err());
        assert!(validate_query(&words(&["   "])).is_err());
    }

    #[test]
    fn test_validate_query_rejects_too_long() {
        let long = "猫".repeat(MAX_QUERY_CHARS + 1);
        assert!(validate_query(&[long]).is_err());

        let exact = "猫".repeat(MAX_QUERY_CHARS);
        assert!(validate_query(&[exact]).is_ok());
    }

    #[test]
    fn test_validate_limit() {
        assert!(validate_limit(0).is_err());
        assert!(validate_limit(MAX_LIMIT + 1).is_err());
        assert_eq!(validate_limit(20).unwrap(), 20);
    }

    #[test]
    fn test_normalize_category() {
        assert_eq!(normalize_category(Some("  ".to_string())), None);
        assert_eq!(normalize_category(Some(" 猫咪 ".to_string())), Some("猫咪".to_string()));
        assert_eq!(normalize_category(None), None);
    }

    #[test]
    fn test_validate_meme_id() {
        assert!(validate_meme_id(" ").is_err());
        assert_eq!(validate_meme_id(" 42 ").unwrap(), "42");
    }
}
