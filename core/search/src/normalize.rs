//! Text normalization and tokenization for search.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Lowercase, decompose (NFKD), drop combining marks and collapse runs of
/// whitespace to a single space.
pub fn normalize(text: &str) -> String {
    let folded: String = text
        .to_lowercase()
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '-' | '_' | '@' | '.')
}

/// Split normalized text on whitespace and `-_@.`, dropping empty pieces.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(is_separator)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Café   Crème "), "cafe creme");
        assert_eq!(normalize("GitHub"), "github");
        assert_eq!(normalize("ﬁle"), "file");
        assert_eq!(normalize("\t\n"), "");
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("ada.lovelace@mail-box_io com"),
            vec!["ada", "lovelace", "mail", "box", "io", "com"]
        );
        assert_eq!(tokenize("--..@@"), Vec::<String>::new());
    }
}
