//! LaTeX tabular export for pivoted summaries, for pasting into papers.

use std::fmt::Write as _;

use super::Pivot;

/// Escape the characters that commonly appear in dataset and metric names.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '_' | '%' | '&' | '#' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Render a pivot as a `tabular` environment with a two-line header:
/// datasets spanning their metric columns, then the metric names.
pub fn render(pivot: &Pivot) -> String {
    let mut out = String::new();

    let mut spec = String::from("l");
    for _ in &pivot.columns {
        spec.push('r');
    }
    writeln!(&mut out, "\\begin{{tabular}}{{{}}}", spec).expect("write to string");
    writeln!(&mut out, "\\toprule").expect("write to string");

    // Dataset spans.
    let mut spans: Vec<(String, usize)> = Vec::new();
    for (dataset, _) in &pivot.columns {
        match spans.last_mut() {
            Some((name, width)) if name == dataset => *width += 1,
            _ => spans.push((dataset.clone(), 1)),
        }
    }
    let header: Vec<String> = spans
        .iter()
        .map(|(name, width)| format!("\\multicolumn{{{}}}{{c}}{{{}}}", width, escape(name)))
        .collect();
    writeln!(&mut out, " & {} \\\\", header.join(" & ")).expect("write to string");

    let metrics: Vec<String> = pivot
        .columns
        .iter()
        .map(|(_, metric)| escape(metric))
        .collect();
    writeln!(&mut out, " & {} \\\\", metrics.join(" & ")).expect("write to string");
    writeln!(&mut out, "\\midrule").expect("write to string");

    for (algorithm, cells) in &pivot.rows {
        let values: Vec<String> = cells
            .iter()
            .map(|v| {
                if v.is_nan() {
                    "--".to_string()
                } else {
                    format!("{}", v)
                }
            })
            .collect();
        writeln!(&mut out, "{} & {} \\\\", escape(algorithm), values.join(" & "))
            .expect("write to string");
    }

    writeln!(&mut out, "\\bottomrule").expect("write to string");
    writeln!(&mut out, "\\end{{tabular}}").expect("write to string");
    out
}
