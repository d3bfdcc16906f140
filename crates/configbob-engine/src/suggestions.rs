//! Fuzzy matching for template error suggestions

/// Maximum Levenshtein distance to consider for suggestions
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// Functions registered on every render
pub const AVAILABLE_FUNCTIONS: &[&str] = &[
    "substr",
    "env",
    "indent",
    "yaml",
    "json",
    "jsonindent",
    "jsescape",
    "replace",
    "join",
    "contains",
    "base64encode",
    "absPath",
    "secret",
    // Built-in MiniJinja globals
    "range",
    "dict",
    "namespace",
];

/// Filters registered on every render, on top of MiniJinja's builtins
pub const AVAILABLE_FILTERS: &[&str] = &["yaml", "json", "jsescape", "base64encode", "absPath"];

/// Suggestion result with its distance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub text: String,
    /// Levenshtein distance (lower = better match)
    pub distance: usize,
}

/// Find closest matches from a list of candidates
pub fn find_closest_matches(input: &str, candidates: &[&str], max_results: usize) -> Vec<Suggestion> {
    let mut suggestions: Vec<Suggestion> = candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = strsim::levenshtein(input, candidate);
            (distance > 0 && distance <= MAX_SUGGESTION_DISTANCE).then(|| Suggestion {
                text: candidate.to_string(),
                distance,
            })
        })
        .collect();

    suggestions.sort_by(|a, b| a.distance.cmp(&b.distance).then_with(|| a.text.cmp(&b.text)));
    suggestions.truncate(max_results);
    suggestions
}

fn did_you_mean(matches: &[Suggestion]) -> String {
    let names: Vec<String> = matches.iter().map(|s| format!("`{}`", s.text)).collect();
    format!("Did you mean {}?", names.join(" or "))
}

/// Suggest data keys close to an undefined variable
pub fn suggest_undefined_variable(variable_name: &str, data_keys: &[String]) -> Option<String> {
    let candidates: Vec<&str> = data_keys.iter().map(String::as_str).collect();
    let matches = find_closest_matches(variable_name, &candidates, 3);

    (!matches.is_empty()).then(|| did_you_mean(&matches))
}

/// Suggest corrections for an unknown function
pub fn suggest_unknown_function(func_name: &str) -> String {
    let matches = find_closest_matches(func_name, AVAILABLE_FUNCTIONS, 3);

    if matches.is_empty() {
        format!(
            "Unknown function `{}`. Available functions: {}",
            func_name,
            AVAILABLE_FUNCTIONS.join(", ")
        )
    } else {
        did_you_mean(&matches)
    }
}

/// Suggest corrections for an unknown filter
pub fn suggest_unknown_filter(filter_name: &str) -> String {
    let matches = find_closest_matches(filter_name, AVAILABLE_FILTERS, 3);

    if matches.is_empty() {
        format!(
            "Unknown filter `{}`. Library filters: {}",
            filter_name,
            AVAILABLE_FILTERS.join(", ")
        )
    } else {
        did_you_mean(&matches)
    }
}

/// Extract a quoted name from an error message
pub fn extract_variable_name(msg: &str) -> Option<String> {
    // Pattern: "undefined variable `foo`" or "variable 'foo' is undefined"
    let patterns = [("`", "`"), ("'", "'"), ("\"", "\"")];

    for (start, end) in patterns {
        if let Some(start_idx) = msg.find(start) {
            let rest = &msg[start_idx + start.len()..];
            if let Some(end_idx) = rest.find(end) {
                return Some(rest[..end_idx].to_string());
            }
        }
    }
    None
}

/// Extract function or filter name from an error message
pub fn extract_function_name(msg: &str) -> Option<String> {
    extract_variable_name(msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_closest_matches() {
        let matches = find_closest_matches("yml", AVAILABLE_FUNCTIONS, 3);
        assert_eq!(matches[0].text, "yaml");
        assert_eq!(matches[0].distance, 1);
    }

    #[test]
    fn test_exact_match_is_not_suggested() {
        assert!(find_closest_matches("json", &["json"], 3).is_empty());
    }

    #[test]
    fn test_suggest_undefined_variable() {
        let keys = vec!["database".to_string(), "domain".to_string()];
        let suggestion = suggest_undefined_variable("databse", &keys).unwrap();
        assert!(suggestion.contains("`database`"));
        assert!(suggest_undefined_variable("zzzzzzzz", &keys).is_none());
    }

    #[test]
    fn test_suggest_unknown_function() {
        assert!(suggest_unknown_function("secrets").contains("`secret`"));
        assert!(suggest_unknown_function("qqqqqqqqq").contains("Available functions"));
    }

    #[test]
    fn test_suggest_unknown_filter() {
        assert!(suggest_unknown_filter("jsn").contains("`json`"));
    }

    #[test]
    fn test_extract_variable_name() {
        assert_eq!(extract_variable_name("undefined variable `foo`"), Some("foo".to_string()));
        assert_eq!(extract_variable_name("variable 'bar' is undefined"), Some("bar".to_string()));
        assert_eq!(extract_variable_name("no quotes here"), None);
    }
}
