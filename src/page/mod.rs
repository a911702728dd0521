pub mod dictionary;
pub mod document;
pub mod ruby;

pub use dictionary::Dictionary;
pub use document::Document;
pub use ruby::HideMode;

/// Glob match (`*` only) of a page URL against the activation patterns.
pub fn is_supported_page(url: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|pattern| {
        let expr = format!("^{}$", regex::escape(pattern).replace(r"\*", ".*"));
        regex::Regex::new(&expr).map(|re| re.is_match(url)).unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    #[test]
    fn test_default_patterns() {
        let patterns = Settings::default().page_patterns;

        assert!(is_supported_page(
            "https://www3.nhk.or.jp/news/easy/ne2024101811425/ne2024101811425.html",
            &patterns
        ));
        assert!(is_supported_page("https://www3.nhk.or.jp/news/html/20241018/k10014612341000.html", &patterns));
        assert!(!is_supported_page("https://www3.nhk.or.jp/sports/", &patterns));
        assert!(!is_supported_page("https://example.com/?u=https://www3.nhk.or.jp/news/easy/", &patterns));
    }

    #[test]
    fn test_pattern_is_literal_apart_from_star() {
        let patterns = vec!["https://a.example/news.html".to_string()];

        assert!(is_supported_page("https://a.example/news.html", &patterns));
        assert!(!is_supported_page("https://a.example/newsxhtml", &patterns));
    }

    #[test]
    fn test_regex_metacharacters_in_pattern_match_literally() {
        let patterns = vec!["https://a.example/(news)+[1]|x.html?id=*".to_string()];

        assert!(is_supported_page("https://a.example/(news)+[1]|x.html?id=42", &patterns));
        assert!(!is_supported_page("https://a.example/newsnews1", &patterns));
    }
}
