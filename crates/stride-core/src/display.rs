//! Text splitting for plan cells.
//!
//! A main-workout cell like `"Strength: Squats, Bench"` renders as a
//! heading line followed by one line per item. Lower-back cells are plain
//! comma lists.

/// Split a comma list into trimmed, non-empty lines.
pub fn split_detail_lines(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Split a main-workout cell into display lines.
///
/// With a colon, the text before the first colon becomes a heading
/// (re-emitted with a trailing colon) and the rest is split on commas.
/// Without one, the whole value is split on commas.
pub fn format_main_workout(value: &str) -> Vec<String> {
    match value.split_once(':') {
        Some((heading, details)) => {
            let mut lines = vec![format!("{}:", heading.trim())];
            lines.extend(split_detail_lines(details));
            lines
        }
        None => split_detail_lines(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_then_items() {
        assert_eq!(
            format_main_workout("Strength: Squats, Bench"),
            vec!["Strength:", "Squats", "Bench"]
        );
    }

    #[test]
    fn no_colon_is_a_plain_list() {
        assert_eq!(format_main_workout("Squats, Bench"), vec!["Squats", "Bench"]);
    }

    #[test]
    fn only_the_first_colon_splits() {
        assert_eq!(
            format_main_workout("Intervals: 4x400 @ 1:45, Cooldown"),
            vec!["Intervals:", "4x400 @ 1:45", "Cooldown"]
        );
    }

    #[test]
    fn empty_items_are_dropped() {
        assert_eq!(split_detail_lines(" a, ,b,, "), vec!["a", "b"]);
        assert!(split_detail_lines("").is_empty());
        assert!(format_main_workout("").is_empty());
    }

    #[test]
    fn heading_without_items() {
        assert_eq!(format_main_workout("Rest day:"), vec!["Rest day:"]);
    }
}
