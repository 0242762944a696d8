//! Single-line quoted-CSV field scanner.
//!
//! The scanner is lenient: it never fails. An unterminated quote simply
//! runs to the end of the line and whatever was accumulated is flushed.

/// Split one CSV line into trimmed fields.
///
/// - Fields are separated by commas outside quotes.
/// - `"` toggles the quoted state; the quote itself is not kept.
/// - Inside quotes, `""` is a literal `"`.
/// - Each field is trimmed after extraction, so whitespace inside quotes
///   next to the boundary is trimmed too.
/// - The last field is always emitted, even without a trailing comma.
pub fn parse_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_owned());
                current.clear();
            }
            _ => current.push(c),
        }
    }

    fields.push(current.trim().to_owned());
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_plain_fields() {
        assert_eq!(parse_csv_line("a,b,c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn trims_every_field() {
        assert_eq!(parse_csv_line("  a , b ,c  "), vec!["a", "b", "c"]);
    }

    #[test]
    fn comma_inside_quotes_does_not_split() {
        let fields =
            parse_csv_line(r#""2026-01-05",Mon,"Squats: 3x5, Bench: 3x5",Side plank,Crunches"#);
        assert_eq!(
            fields,
            vec![
                "2026-01-05",
                "Mon",
                "Squats: 3x5, Bench: 3x5",
                "Side plank",
                "Crunches"
            ]
        );
    }

    #[test]
    fn doubled_quote_is_literal() {
        let fields = parse_csv_line(r#""She said ""go""",rest"#);
        assert_eq!(fields, vec![r#"She said "go""#, "rest"]);
    }

    #[test]
    fn whitespace_inside_quotes_is_trimmed_after_unquoting() {
        assert_eq!(parse_csv_line(r#"" padded ",x"#), vec!["padded", "x"]);
    }

    #[test]
    fn trailing_comma_yields_empty_last_field() {
        assert_eq!(parse_csv_line("a,b,"), vec!["a", "b", ""]);
    }

    #[test]
    fn empty_line_yields_single_empty_field() {
        assert_eq!(parse_csv_line(""), vec![""]);
    }

    #[test]
    fn unterminated_quote_runs_to_end_of_line() {
        assert_eq!(parse_csv_line(r#"a,"b, c"#), vec!["a", "b, c"]);
    }

    #[test]
    fn doubled_quote_outside_quotes_toggles_twice() {
        // Outside quotes `""` opens and closes an empty quoted run.
        assert_eq!(parse_csv_line(r#"a""b,c"#), vec!["ab", "c"]);
    }
}
