//! Parsing of `highlight="3,5-10,22"` style line selections.

use std::sync::LazyLock;

use regex::Regex;
use syntaxhighlight_protocol::HIGHLIGHT_MAX_LINES;

static RANGE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(?P<start>\d+) *- *(?P<end>\d+)$").ok());

/// Expands a comma-separated list of lines and `start-end` ranges into line numbers.
///
/// Malformed tokens are dropped. Ranges must ascend and span at most
/// [`HIGHLIGHT_MAX_LINES`] lines; descending ranges are dropped. The result keeps
/// encounter order, may contain duplicates, and never exceeds
/// [`HIGHLIGHT_MAX_LINES`] entries.
pub fn parse_lines(spec: &str) -> Vec<u32> {
    let mut lines: Vec<u32> = Vec::new();

    for token in spec.split(',').map(str::trim) {
        if is_line_number(token) {
            if let Ok(line) = token.parse() {
                lines.push(line);
            }
        } else if let Some((start, end)) = parse_range(token) {
            lines.extend(start..=end);
        }

        if lines.len() > HIGHLIGHT_MAX_LINES {
            lines.truncate(HIGHLIGHT_MAX_LINES);
            break;
        }
    }

    lines
}

fn is_line_number(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

fn parse_range(token: &str) -> Option<(u32, u32)> {
    let captures = RANGE.as_ref()?.captures(token)?;
    let start: u32 = captures.name("start")?.as_str().parse().ok()?;
    let end: u32 = captures.name("end")?.as_str().parse().ok()?;
    let span = end.checked_sub(start)?;
    (span as usize <= HIGHLIGHT_MAX_LINES).then_some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn mixes_single_lines_and_ranges() {
        assert_eq!(parse_lines("3,5-10,22"), vec![3, 5, 6, 7, 8, 9, 10, 22]);
    }

    #[test]
    fn tolerates_whitespace_around_commas_and_hyphens() {
        assert_eq!(parse_lines(" 1 ,  2 - 4,7"), vec![1, 2, 3, 4, 7]);
    }

    #[test]
    fn drops_malformed_tokens() {
        assert_eq!(parse_lines("abc,5-,-3,1.5,4,,x-y,8"), vec![4, 8]);
        assert_eq!(parse_lines(""), Vec::<u32>::new());
    }

    #[test]
    fn keeps_duplicates_and_encounter_order() {
        assert_eq!(parse_lines("5,5,3-5"), vec![5, 5, 3, 4, 5]);
    }

    #[test]
    fn single_line_range_is_accepted() {
        assert_eq!(parse_lines("7-7"), vec![7]);
    }

    #[test]
    fn descending_ranges_are_dropped() {
        assert_eq!(parse_lines("10-5,2"), vec![2]);
    }

    #[test]
    fn ranges_wider_than_the_limit_are_dropped() {
        assert_eq!(parse_lines("1-1002"), Vec::<u32>::new());
        assert_eq!(parse_lines("0-1000").len(), 1000);
        assert_eq!(parse_lines("1-1002,9"), vec![9]);
    }

    #[test]
    fn output_is_capped() {
        let lines = parse_lines("1-1000,2000-2500,5");
        assert_eq!(lines.len(), HIGHLIGHT_MAX_LINES);
        assert_eq!(lines.first(), Some(&1));
        assert_eq!(lines.last(), Some(&1000));

        let singles = (1..=1500).map(|n| n.to_string()).collect::<Vec<_>>();
        assert_eq!(parse_lines(&singles.join(",")).len(), HIGHLIGHT_MAX_LINES);
    }

    #[test]
    fn oversized_numbers_are_dropped() {
        assert_eq!(parse_lines("99999999999,3"), vec![3]);
    }
}
