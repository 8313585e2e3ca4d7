/// Reduces an arbitrary title or model name to something safe to use in a
/// file name. Alphanumerics, `-`, `_` and `.` pass through; everything else
/// becomes `_`.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_safe_characters() {
        assert_eq!(sanitize_filename("Two_Sum-1.5"), "Two_Sum-1.5");
    }

    #[test]
    fn replaces_separators_and_punctuation() {
        assert_eq!(sanitize_filename("Dice Combinations"), "Dice_Combinations");
        assert_eq!(sanitize_filename("a/b\\c:d"), "a_b_c_d");
        assert_eq!(sanitize_filename("gpt-4o (preview)"), "gpt-4o__preview_");
    }
}
