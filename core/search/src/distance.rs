//! Bounded edit distance.

/// Levenshtein distance between `a` and `b`, or `None` once it is certain to
/// exceed `max`.
///
/// Runs the single-row dynamic program over the shorter string. Bails out
/// before any work when the lengths differ by more than `max`, and after any
/// row whose smallest cell already exceeds `max`, so the cost per call is
/// bounded regardless of how long the inputs are.
pub fn levenshtein_bounded(a: &str, b: &str, max: usize) -> Option<usize> {
    let mut short: Vec<char> = a.chars().collect();
    let mut long: Vec<char> = b.chars().collect();

    if short.len().abs_diff(long.len()) > max {
        return None;
    }
    if short.len() > long.len() {
        std::mem::swap(&mut short, &mut long);
    }

    let mut previous: Vec<usize> = (0..=short.len()).collect();
    let mut current = vec![0; short.len() + 1];

    for (i, &lc) in long.iter().enumerate() {
        current[0] = i + 1;
        let mut row_min = current[0];

        for (j, &sc) in short.iter().enumerate() {
            let substitution = previous[j] + usize::from(sc != lc);
            let insertion = current[j] + 1;
            let deletion = previous[j + 1] + 1;
            current[j + 1] = substitution.min(insertion).min(deletion);
            row_min = row_min.min(current[j + 1]);
        }

        if row_min > max {
            return None;
        }
        std::mem::swap(&mut previous, &mut current);
    }

    let distance = previous[short.len()];
    (distance <= max).then_some(distance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn levenshtein(a: &str, b: &str) -> usize {
        levenshtein_bounded(a, b, usize::MAX / 2).unwrap()
    }

    #[test]
    fn test_known_distances() {
        assert_eq!(levenshtein_bounded("gitub", "github", 2), Some(1));
        assert_eq!(levenshtein_bounded("kitten", "sitting", 2), None);
        assert_eq!(levenshtein_bounded("kitten", "sitting", 3), Some(3));
        assert_eq!(levenshtein_bounded("", "ab", 2), Some(2));
        assert_eq!(levenshtein_bounded("same", "same", 0), Some(0));
    }

    #[test]
    fn test_length_gap_rejected() {
        assert_eq!(levenshtein_bounded("ab", "abcdef", 2), None);
    }

    #[test]
    fn test_over_limit_rejected() {
        assert_eq!(levenshtein_bounded("github", "gxtxxb", 2), None);
    }

    proptest! {
        #[test]
        fn prop_symmetric(a in "[a-d]{0,8}", b in "[a-d]{0,8}") {
            prop_assert_eq!(levenshtein(&a, &b), levenshtein(&b, &a));
        }

        #[test]
        fn prop_bounded_agrees_with_full(a in "[a-c]{0,7}", b in "[a-c]{0,7}", max in 0usize..4) {
            let full = levenshtein(&a, &b);
            let bounded = levenshtein_bounded(&a, &b, max);
            if full <= max {
                prop_assert_eq!(bounded, Some(full));
            } else {
                prop_assert_eq!(bounded, None);
            }
        }
    }
}
