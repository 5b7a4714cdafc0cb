//! Scraper for the search tool's console output.
//!
//! The tool reports scores and timings as human-readable lines. Rather than
//! ad hoc substring searches, the contract is written down as a fixed rule
//! list: a marker string introduces a numeric field and a terminator ends it.

use crate::{Result, TreebenchError};

/// What ends the numeric field following a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    /// The literal `" seconds"` suffix used by timing lines.
    Seconds,
    /// End of line (or end of output).
    LineEnd,
}

/// One marker-to-field rule of the output grammar.
#[derive(Debug, Clone, Copy)]
pub struct MarkerRule {
    pub marker: &'static str,
    pub terminator: Terminator,
}

/// Quartet score variants emitted for the final tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Lqic,
    Qpic,
    Eqpic,
}

impl Score {
    pub fn rule(self) -> MarkerRule {
        let marker = match self {
            Score::Lqic => "Sum LQIC final Tree: ",
            Score::Qpic => "Sum QPIC final Tree: ",
            Score::Eqpic => "Sum EQPIC final Tree: ",
        };
        MarkerRule {
            marker,
            terminator: Terminator::LineEnd,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Score::Lqic => "LQIC",
            Score::Qpic => "QPIC",
            Score::Eqpic => "EQPIC",
        }
    }
}

/// Timing lines, in the order the tool emits them.
const TIME_RULES: [MarkerRule; 5] = [
    MarkerRule {
        marker: "Time Count Quartets: ",
        terminator: Terminator::Seconds,
    },
    MarkerRule {
        marker: "Time Start Tree: ",
        terminator: Terminator::Seconds,
    },
    MarkerRule {
        marker: "Time Tree Search: ",
        terminator: Terminator::Seconds,
    },
    MarkerRule {
        marker: "Time Tree Search Clustered: ",
        terminator: Terminator::Seconds,
    },
    MarkerRule {
        marker: "Time Total: ",
        terminator: Terminator::Seconds,
    },
];

/// Elapsed-seconds breakdown of one run. Fields whose marker is absent from
/// the output stay at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimeBreakdown {
    pub count_quartets: f64,
    pub start_tree: f64,
    pub search: f64,
    pub search_clustered: f64,
    pub total: f64,
}

impl TimeBreakdown {
    /// Start tree plus both search phases; what reports call `runtime_total`
    /// when the tool does not emit a `Time Total` line.
    pub fn spent_searching(&self) -> f64 {
        self.start_tree + self.search + self.search_clustered
    }
}

/// Apply a single rule at or after `from`, returning the parsed value and the
/// position just past the marker (for ordered scans).
fn apply_rule(output: &str, rule: &MarkerRule, from: usize) -> Option<(f64, usize)> {
    let pos = output.get(from..)?.find(rule.marker)? + from;
    let start = pos + rule.marker.len();
    let rest = &output[start..];
    let end = match rule.terminator {
        Terminator::Seconds => rest.find(" seconds")?,
        Terminator::LineEnd => rest.find('\n').unwrap_or(rest.len()),
    };
    let value: f64 = rest[..end].trim().parse().ok()?;
    Some((value, start))
}

/// Extract a quartet score from captured output.
///
/// A missing marker is an unknown value (`None`) unless the caller demands
/// the score, in which case it is an error carrying the marker text.
pub fn parse_score(output: &str, score: Score, mandatory: bool) -> Result<Option<f64>> {
    let rule = score.rule();
    match apply_rule(output, &rule, 0) {
        Some((value, _)) => Ok(Some(value)),
        None if mandatory => Err(TreebenchError::MissingMarker {
            marker: rule.marker.to_string(),
        }),
        None => Ok(None),
    }
}

/// Extract the timing breakdown. Markers are scanned in emission order so a
/// value is never picked up from an earlier phase's line.
pub fn parse_times(output: &str) -> TimeBreakdown {
    let mut values = [0.0f64; 5];
    let mut from = 0;
    for (i, rule) in TIME_RULES.iter().enumerate() {
        if let Some((value, next)) = apply_rule(output, rule, from) {
            values[i] = value;
            from = next;
        }
    }
    TimeBreakdown {
        count_quartets: values[0],
        start_tree: values[1],
        search: values[2],
        search_clustered: values[3],
        total: values[4],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "\
Compute quartet score based Tree
Time Count Quartets: 1.25 seconds
Time Start Tree: 0.5 seconds
Time Tree Search: 10.75 seconds
Time Total: 12.5 seconds
Sum LQIC final Tree: -123.456
Sum QPIC final Tree: 7.5
Done
";

    #[test]
    fn scores_parse() {
        assert_eq!(
            parse_score(SAMPLE, Score::Lqic, true).unwrap(),
            Some(-123.456)
        );
        assert_eq!(parse_score(SAMPLE, Score::Qpic, false).unwrap(), Some(7.5));
    }

    #[test]
    fn missing_optional_score_is_none() {
        assert_eq!(parse_score(SAMPLE, Score::Eqpic, false).unwrap(), None);
    }

    #[test]
    fn missing_mandatory_score_is_fatal() {
        let err = parse_score(SAMPLE, Score::Eqpic, true).unwrap_err();
        match err {
            TreebenchError::MissingMarker { marker } => {
                assert_eq!(marker, "Sum EQPIC final Tree: ")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn times_parse_in_order() {
        let times = parse_times(SAMPLE);
        assert_eq!(times.count_quartets, 1.25);
        assert_eq!(times.start_tree, 0.5);
        assert_eq!(times.search, 10.75);
        assert_eq!(times.search_clustered, 0.0);
        assert_eq!(times.total, 12.5);
        assert_eq!(times.spent_searching(), 11.25);
    }

    #[test]
    fn absent_timing_markers_default_to_zero() {
        let times = parse_times("no timings here\n");
        assert_eq!(times, TimeBreakdown::default());
    }

    #[test]
    fn score_at_end_of_output_without_newline() {
        let out = "Sum LQIC final Tree: 3.25";
        assert_eq!(parse_score(out, Score::Lqic, true).unwrap(), Some(3.25));
    }
}
