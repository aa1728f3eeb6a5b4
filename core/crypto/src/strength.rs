//! Heuristic password strength estimation.
//!
//! Scores run from 0 (very weak) to 4 (strong) and are driven by length
//! first, character-class variety second.

/// Result of [`check_strength`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrengthResult {
    /// Score in `0..=4`.
    pub score: u8,
    /// Human readable label for the score.
    pub label: &'static str,
    /// Coarse offline cracking time bucket.
    pub crack_time: &'static str,
    /// Improvement hints, most important first.
    pub suggestions: Vec<&'static str>,
}

const LABELS: [&str; 5] = ["Very Weak", "Weak", "Fair", "Good", "Strong"];

/// Label for a score; scores above 4 are treated as 4.
pub fn strength_label(score: u8) -> &'static str {
    LABELS[usize::from(score.min(4))]
}

/// Estimate the strength of `password`.
pub fn check_strength(password: &str) -> StrengthResult {
    let length = password.chars().count();

    let mut score: u8 = [8, 12, 16, 24]
        .iter()
        .filter(|&&threshold| length >= threshold)
        .count() as u8;

    let has_lower = password.chars().any(char::is_lowercase);
    let has_upper = password.chars().any(char::is_uppercase);
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password.chars().any(|c| !c.is_alphanumeric());

    let classes = [has_lower, has_upper, has_digit, has_symbol]
        .iter()
        .filter(|&&present| present)
        .count();
    if classes >= 3 {
        score += 1;
    }
    let score = score.min(4);

    let mut suggestions = Vec::new();
    if length < 12 {
        suggestions.push("Use at least 12 characters");
    }
    if !has_upper {
        suggestions.push("Add uppercase letters");
    }
    if !has_lower {
        suggestions.push("Add lowercase letters");
    }
    if !has_digit {
        suggestions.push("Add numbers");
    }
    if !has_symbol {
        suggestions.push("Add special characters");
    }

    let crack_time = if length >= 64 {
        "heat death of the universe"
    } else if length >= 32 {
        "billions of years"
    } else if length >= 20 {
        "millions of years"
    } else {
        match score {
            0 | 1 => "seconds to minutes",
            2 => "hours to days",
            3 => "months to years",
            _ => "centuries",
        }
    };

    StrengthResult {
        score,
        label: strength_label(score),
        crack_time,
        suggestions,
    }
}

/// Check a candidate master password against minimum requirements.
///
/// Returns the list of problems; an empty list means the password passes.
pub fn meets_requirements(password: &str, min_score: u8, min_length: usize) -> Vec<String> {
    let mut issues = Vec::new();

    if password.chars().count() < min_length {
        issues.push(format!(
            "Password must be at least {} characters",
            min_length
        ));
    }

    let result = check_strength(password);
    if result.score < min_score {
        issues.push(format!(
            "Password strength is {}, need at least {}",
            result.label,
            strength_label(min_score)
        ));
        issues.extend(result.suggestions.iter().take(2).map(|s| s.to_string()));
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_simple_password_is_weak() {
        let result = check_strength("abc");
        assert_eq!(result.score, 0);
        assert_eq!(result.label, "Very Weak");
        assert_eq!(result.crack_time, "seconds to minutes");
        assert!(result.suggestions.contains(&"Use at least 12 characters"));
    }

    #[test]
    fn test_long_mixed_password_is_strong() {
        let result = check_strength("Correct-Horse-Battery-9");
        assert_eq!(result.score, 4);
        assert_eq!(result.crack_time, "millions of years");
        assert!(result.suggestions.is_empty());
    }

    #[test]
    fn test_mid_strength() {
        // 12 chars: two length points, three classes: one more.
        let result = check_strength("abcdefGH1234");
        assert_eq!(result.score, 3);
        assert_eq!(result.label, "Good");
    }

    #[test]
    fn test_meets_requirements() {
        assert!(meets_requirements("Correct-Horse-Battery-9", 2, 8).is_empty());

        let issues = meets_requirements("abc", 2, 8);
        assert_eq!(issues[0], "Password must be at least 8 characters");
        assert!(issues[1].contains("need at least Fair"));
    }
}
