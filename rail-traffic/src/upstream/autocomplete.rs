//! Parser for the train-number autocomplete endpoint.
//!
//! Unlike the other endpoints this one answers with plain text, one
//! candidate per line:
//!
//! ```text
//! 3914 - ANCONA - 03/11/25|3914-S07113-1762124400000
//! ```
//!
//! The label before `|` names the departure station after the first
//! `" - "`; the code after it holds the train number and the departure
//! station id as its first two `-`-separated parts.

use crate::domain::TrainAutocompleteMatch;

use super::convert::ConversionError;

/// Parse the whole response body. Blank lines are skipped.
pub fn parse_autocomplete(body: &str) -> Result<Vec<TrainAutocompleteMatch>, ConversionError> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(parse_line)
        .collect()
}

/// Parse a single non-empty line.
///
/// ```
/// use rail_traffic::upstream::parse_autocomplete_line;
///
/// let m = parse_autocomplete_line("3914 - ANCONA - 03/11/25|3914-S07113-1762124400000").unwrap();
/// assert_eq!(m.train_number, 3914);
/// assert_eq!(m.station_a, "ANCONA");
/// assert_eq!(m.station_id_a, "S07113");
/// ```
pub fn parse_line(line: &str) -> Result<TrainAutocompleteMatch, ConversionError> {
    let invalid = || ConversionError::InvalidAutocomplete(line.to_string());

    let (label, code) = line.split_once('|').ok_or_else(invalid)?;

    let station_a = label
        .split(" - ")
        .nth(1)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(invalid)?;

    let mut parts = code.trim().split('-');
    let train_number = parts
        .next()
        .and_then(|n| n.trim().parse::<u32>().ok())
        .ok_or_else(invalid)?;
    let station_id_a = parts
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(invalid)?;

    Ok(TrainAutocompleteMatch {
        train_number,
        station_a: station_a.to_string(),
        station_id_a: station_id_a.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line() {
        let matches =
            parse_autocomplete("3914 - ANCONA - 03/11/25|3914-S07113-1762124400000\n").unwrap();

        assert_eq!(
            matches,
            vec![TrainAutocompleteMatch {
                train_number: 3914,
                station_a: "ANCONA".to_string(),
                station_id_a: "S07113".to_string(),
            }]
        );
    }

    #[test]
    fn several_lines_keep_order() {
        let body = "\
            2100 - MILANO CENTRALE - 03/11/25|2100-S01700-1762124400000\n\
            \n\
            2100 - NAPOLI CENTRALE - 03/11/25|2100-S09218-1762124400000\n";

        let matches = parse_autocomplete(body).unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].station_id_a, "S01700");
        assert_eq!(matches[1].station_a, "NAPOLI CENTRALE");
    }

    #[test]
    fn station_name_with_hyphen() {
        let m = parse_line("5043 - BOLZANO-BOZEN - 03/11/25|5043-S02026-1762124400000").unwrap();
        assert_eq!(m.station_a, "BOLZANO-BOZEN");
        assert_eq!(m.station_id_a, "S02026");
    }

    #[test]
    fn empty_body_has_no_matches() {
        assert!(parse_autocomplete("").unwrap().is_empty());
        assert!(parse_autocomplete("\n \n").unwrap().is_empty());
    }

    #[test]
    fn malformed_lines_fail() {
        assert!(parse_line("3914 - ANCONA - 03/11/25").is_err());
        assert!(parse_line("3914|3914-S07113").is_err());
        assert!(parse_line("3914 - ANCONA|abc-S07113").is_err());
        assert!(parse_line("3914 - ANCONA|3914").is_err());
        assert!(parse_autocomplete("ok - A|1-S1-0\nbroken").is_err());
    }
}
