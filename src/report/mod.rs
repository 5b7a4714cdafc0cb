//! Result aggregation: one row per experiment run, delimited-text
//! persistence, grouped statistics and pivoted summaries.

pub mod latex;
pub mod plot;

use std::fmt::Write as _;
use std::path::Path;

use crate::config::ReportRules;
use crate::{Result, TreebenchError};

/// One experiment run: configuration identity, timing breakdown, quartet
/// scores and RF distance against the reference tree. Scores the tool did
/// not report stay `None` and serialize as NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub dataset: String,
    pub algorithm: String,
    pub seed: u64,
    pub runtime_start: f64,
    pub runtime_count: f64,
    pub runtime_search: f64,
    pub lqic: Option<f64>,
    pub qpic: Option<f64>,
    pub eqpic: Option<f64>,
    pub rf: f64,
    pub rf_normalized: f64,
}

impl RunRecord {
    pub fn runtime_total(&self) -> f64 {
        self.runtime_start + self.runtime_count + self.runtime_search
    }
}

/// Numeric columns of the table, with their extractors.
pub const METRICS: &[(&str, fn(&RunRecord) -> Option<f64>)] = &[
    ("runtime_start", |r| Some(r.runtime_start)),
    ("runtime_count", |r| Some(r.runtime_count)),
    ("runtime_search", |r| Some(r.runtime_search)),
    ("runtime_total", |r| Some(r.runtime_total())),
    ("LQIC", |r| r.lqic),
    ("QPIC", |r| r.qpic),
    ("EQPIC", |r| r.eqpic),
    ("RF", |r| Some(r.rf)),
    ("RF_normalized", |r| Some(r.rf_normalized)),
];

const CSV_HEADER: &str = "Dataset,Algorithm,Seed,runtime_start,runtime_count,runtime_search,runtime_total,LQIC,QPIC,EQPIC,RF,RF_normalized";

/// Mean and sample variance of every metric within one (dataset, algorithm)
/// group. Variance is NaN for groups of one.
#[derive(Debug, Clone)]
pub struct GroupStats {
    pub dataset: String,
    pub algorithm: String,
    pub runs: usize,
    /// (metric name, mean, variance)
    pub metrics: Vec<(String, f64, f64)>,
}

/// Pivoted summary: one row per algorithm, dataset-major metric columns.
#[derive(Debug, Clone)]
pub struct Pivot {
    /// (dataset, metric) column pairs, dataset-major.
    pub columns: Vec<(String, String)>,
    /// (algorithm, cell values aligned with `columns`)
    pub rows: Vec<(String, Vec<f64>)>,
}

#[derive(Debug, Clone, Default)]
pub struct ResultTable {
    records: Vec<RunRecord>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: RunRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[RunRecord] {
        &self.records
    }

    pub fn to_csv(&self) -> String {
        fn cell(v: Option<f64>) -> String {
            match v {
                Some(x) => format!("{}", x),
                None => "NaN".to_string(),
            }
        }

        let mut out = String::new();
        writeln!(&mut out, "{}", CSV_HEADER).expect("write to string");
        for r in &self.records {
            writeln!(
                &mut out,
                "{},{},{},{},{},{},{},{},{},{},{},{}",
                r.dataset,
                r.algorithm,
                r.seed,
                r.runtime_start,
                r.runtime_count,
                r.runtime_search,
                r.runtime_total(),
                cell(r.lqic),
                cell(r.qpic),
                cell(r.eqpic),
                r.rf,
                r.rf_normalized,
            )
            .expect("write to string");
        }
        out
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_csv())?;
        Ok(())
    }

    pub fn from_csv(text: &str) -> Result<Self> {
        let mut lines = text.lines();
        let header = lines
            .next()
            .ok_or_else(|| TreebenchError::Checkpoint("empty result table".into()))?;
        if header.trim() != CSV_HEADER {
            return Err(TreebenchError::Checkpoint(format!(
                "unexpected header {:?}",
                header
            )));
        }

        let mut records = Vec::new();
        for (lineno, line) in lines.enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split(',').collect();
            if fields.len() != 12 {
                return Err(TreebenchError::Checkpoint(format!(
                    "line {}: expected 12 fields, got {}",
                    lineno + 2,
                    fields.len()
                )));
            }
            let num = |s: &str| -> Result<f64> {
                s.parse().map_err(|_| {
                    TreebenchError::Checkpoint(format!("line {}: bad number {:?}", lineno + 2, s))
                })
            };
            let opt = |s: &str| -> Result<Option<f64>> {
                if s == "NaN" {
                    Ok(None)
                } else {
                    num(s).map(Some)
                }
            };
            records.push(RunRecord {
                dataset: fields[0].to_string(),
                algorithm: fields[1].to_string(),
                seed: fields[2].parse().map_err(|_| {
                    TreebenchError::Checkpoint(format!(
                        "line {}: bad seed {:?}",
                        lineno + 2,
                        fields[2]
                    ))
                })?,
                runtime_start: num(fields[3])?,
                runtime_count: num(fields[4])?,
                runtime_search: num(fields[5])?,
                // fields[6] is the derived total; recomputed on demand.
                lqic: opt(fields[7])?,
                qpic: opt(fields[8])?,
                eqpic: opt(fields[9])?,
                rf: num(fields[10])?,
                rf_normalized: num(fields[11])?,
            });
        }
        Ok(Self { records })
    }

    pub fn load_csv(path: &Path) -> Result<Self> {
        Self::from_csv(&std::fs::read_to_string(path)?)
    }

    /// Mean/variance per (dataset, algorithm) group, groups in first-seen
    /// order.
    pub fn grouped_stats(&self) -> Vec<GroupStats> {
        let mut groups: Vec<(String, String, Vec<&RunRecord>)> = Vec::new();
        for r in &self.records {
            match groups
                .iter_mut()
                .find(|(d, a, _)| *d == r.dataset && *a == r.algorithm)
            {
                Some((_, _, members)) => members.push(r),
                None => groups.push((r.dataset.clone(), r.algorithm.clone(), vec![r])),
            }
        }

        groups
            .into_iter()
            .map(|(dataset, algorithm, members)| {
                let metrics = METRICS
                    .iter()
                    .map(|(name, extract)| {
                        let values: Vec<f64> = members.iter().filter_map(|r| extract(r)).collect();
                        let (mean, var) = mean_and_variance(&values);
                        (name.to_string(), mean, var)
                    })
                    .collect();
                GroupStats {
                    dataset,
                    algorithm,
                    runs: members.len(),
                    metrics,
                }
            })
            .collect()
    }

    /// Pivot group means into a dataset-major summary, applying the report
    /// shaping rules: metric renames, dataset replacements, column selection
    /// and rounding.
    pub fn pivot(&self, rules: &ReportRules) -> Pivot {
        let rename = |name: &str| -> String {
            rules
                .rename
                .get(name)
                .cloned()
                .unwrap_or_else(|| name.to_string())
        };
        let replace = |name: &str| -> String {
            rules
                .replace
                .get(name)
                .cloned()
                .unwrap_or_else(|| name.to_string())
        };

        let selected: Vec<String> = if rules.columns.is_empty() {
            METRICS.iter().map(|(n, _)| rename(n)).collect()
        } else {
            rules.columns.clone()
        };

        let mut datasets: Vec<String> = self.records.iter().map(|r| replace(&r.dataset)).collect();
        datasets.sort();
        datasets.dedup();

        let mut algorithms: Vec<String> = Vec::new();
        for r in &self.records {
            if !algorithms.contains(&r.algorithm) {
                algorithms.push(r.algorithm.clone());
            }
        }

        let mut columns = Vec::new();
        for dataset in &datasets {
            for metric in &selected {
                columns.push((dataset.clone(), metric.clone()));
            }
        }

        let factor = 10f64.powi(rules.round as i32);
        let rows = algorithms
            .into_iter()
            .map(|algorithm| {
                let cells = columns
                    .iter()
                    .map(|(dataset, metric)| {
                        let values: Vec<f64> = self
                            .records
                            .iter()
                            .filter(|r| r.algorithm == algorithm && replace(&r.dataset) == *dataset)
                            .filter_map(|r| {
                                METRICS
                                    .iter()
                                    .find(|(n, _)| rename(n) == *metric)
                                    .and_then(|(_, extract)| extract(r))
                            })
                            .collect();
                        let (mean, _) = mean_and_variance(&values);
                        (mean * factor).round() / factor
                    })
                    .collect();
                (algorithm, cells)
            })
            .collect();

        Pivot { columns, rows }
    }
}

fn mean_and_variance(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (f64::NAN, f64::NAN);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if values.len() < 2 {
        return (mean, f64::NAN);
    }
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, var)
}

/// Grouped statistics as delimited text, one row per group with mean and
/// variance columns per metric.
pub fn stats_csv(stats: &[GroupStats]) -> String {
    let mut out = String::new();
    let mut header = String::from("Dataset,Algorithm,n");
    if let Some(first) = stats.first() {
        for (name, _, _) in &first.metrics {
            write!(&mut header, ",{}_mean,{}_var", name, name).expect("write to string");
        }
    }
    writeln!(&mut out, "{}", header).expect("write to string");
    for group in stats {
        write!(&mut out, "{},{},{}", group.dataset, group.algorithm, group.runs)
            .expect("write to string");
        for (_, mean, var) in &group.metrics {
            write!(&mut out, ",{},{}", mean, var).expect("write to string");
        }
        writeln!(&mut out).expect("write to string");
    }
    out
}

/// Pivoted summary as delimited text with `dataset:metric` column names.
pub fn pivot_csv(pivot: &Pivot) -> String {
    let mut out = String::new();
    let mut header = String::from("Algorithm");
    for (dataset, metric) in &pivot.columns {
        write!(&mut header, ",{}:{}", dataset, metric).expect("write to string");
    }
    writeln!(&mut out, "{}", header).expect("write to string");
    for (algorithm, cells) in &pivot.rows {
        write!(&mut out, "{}", algorithm).expect("write to string");
        for cell in cells {
            write!(&mut out, ",{}", cell).expect("write to string");
        }
        writeln!(&mut out).expect("write to string");
    }
    out
}

/// Render grouped statistics as a terminal table.
pub fn stats_table(stats: &[GroupStats]) -> comfy_table::Table {
    use comfy_table::presets::UTF8_FULL;
    use comfy_table::{ContentArrangement, Table};

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let mut header = vec![
        "Dataset".to_string(),
        "Algorithm".to_string(),
        "n".to_string(),
    ];
    if let Some(first) = stats.first() {
        for (name, _, _) in &first.metrics {
            header.push(format!("{} mean", name));
            header.push(format!("{} var", name));
        }
    }
    table.set_header(header);

    for group in stats {
        let mut row = vec![
            group.dataset.clone(),
            group.algorithm.clone(),
            group.runs.to_string(),
        ];
        for (_, mean, var) in &group.metrics {
            row.push(format!("{:.4}", mean));
            row.push(format!("{:.4}", var));
        }
        table.add_row(row);
    }
    table
}

/// Render a pivoted summary as a terminal table.
pub fn pivot_table(pivot: &Pivot) -> comfy_table::Table {
    use comfy_table::presets::UTF8_FULL;
    use comfy_table::{ContentArrangement, Table};

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let mut header = vec!["Algorithm".to_string()];
    for (dataset, metric) in &pivot.columns {
        header.push(format!("{} {}", dataset, metric));
    }
    table.set_header(header);

    for (algorithm, cells) in &pivot.rows {
        let mut row = vec![algorithm.clone()];
        for cell in cells {
            row.push(format!("{}", cell));
        }
        table.add_row(row);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(dataset: &str, algorithm: &str, seed: u64, lqic: Option<f64>, rf: f64) -> RunRecord {
        RunRecord {
            dataset: dataset.to_string(),
            algorithm: algorithm.to_string(),
            seed,
            runtime_start: 1.0,
            runtime_count: 2.0,
            runtime_search: 3.0,
            lqic,
            qpic: None,
            eqpic: None,
            rf: rf * 10.0,
            rf_normalized: rf,
        }
    }

    #[test]
    fn csv_round_trip() {
        let mut table = ResultTable::new();
        table.push(record("yeast", "nni", 0, Some(-12.5), 0.25));
        table.push(record("yeast", "nni", 1, None, 0.5));

        let parsed = ResultTable::from_csv(&table.to_csv()).unwrap();
        assert_eq!(parsed.records(), table.records());
    }

    #[test]
    fn rejects_foreign_header() {
        assert!(ResultTable::from_csv("a,b,c\n1,2,3\n").is_err());
    }

    #[test]
    fn grouped_stats_mean_and_variance() {
        let mut table = ResultTable::new();
        table.push(record("yeast", "nni", 0, Some(1.0), 0.2));
        table.push(record("yeast", "nni", 1, Some(3.0), 0.4));
        table.push(record("yeast", "spr", 0, Some(5.0), 0.1));

        let stats = table.grouped_stats();
        assert_eq!(stats.len(), 2);
        let nni = &stats[0];
        assert_eq!(nni.runs, 2);
        let lqic = nni.metrics.iter().find(|(n, _, _)| n == "LQIC").unwrap();
        assert_eq!(lqic.1, 2.0);
        assert_eq!(lqic.2, 2.0);
        // Single-run group has undefined variance.
        let spr_lqic = stats[1].metrics.iter().find(|(n, _, _)| n == "LQIC").unwrap();
        assert!(spr_lqic.2.is_nan());
    }

    #[test]
    fn pivot_applies_shaping_rules() {
        let mut table = ResultTable::new();
        table.push(record("model102.estimated_gene", "nni", 0, Some(1.234), 0.256));
        table.push(record("model102.estimated_gene", "nni", 1, Some(2.234), 0.25));
        table.push(record("model102.estimated_gene", "spr", 0, Some(9.0), 0.8));

        let rules = ReportRules {
            rename: [("RF_normalized".to_string(), "RF_norm".to_string())]
                .into_iter()
                .collect(),
            replace: [(
                "model102.estimated_gene".to_string(),
                "model102".to_string(),
            )]
            .into_iter()
            .collect(),
            columns: vec!["LQIC".to_string(), "RF_norm".to_string()],
            round: 2,
        };

        let pivot = table.pivot(&rules);
        assert_eq!(
            pivot.columns,
            vec![
                ("model102".to_string(), "LQIC".to_string()),
                ("model102".to_string(), "RF_norm".to_string()),
            ]
        );
        assert_eq!(pivot.rows.len(), 2);
        assert_eq!(pivot.rows[0].0, "nni");
        assert_eq!(pivot.rows[0].1, vec![1.73, 0.25]);
        assert_eq!(pivot.rows[1].1, vec![9.0, 0.8]);
    }
}
