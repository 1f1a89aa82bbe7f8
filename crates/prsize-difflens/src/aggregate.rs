//! Summing per-file stats into a change count and a label.

use prsize_core::{FileStat, Label, LineClass};
use serde::Serialize;

use crate::filter::ExclusionPolicy;
use crate::label::LabelTable;

/// Total stats over a change set, the weighted change count and its label.
///
/// # Examples
///
/// ```
/// use prsize_core::{FileStat, PrsizeConfig};
/// use prsize_difflens::aggregate::aggregate;
/// use prsize_difflens::filter::ExclusionPolicy;
/// use prsize_difflens::label::LabelTable;
///
/// let labels = LabelTable::new(PrsizeConfig::default_labels()).unwrap();
/// let result = aggregate(&[], &ExclusionPolicy::default(), &labels);
/// assert_eq!(result.changes, 0);
/// assert_eq!(result.stats, FileStat::default());
/// assert_eq!(result.label.name, "Extra Small");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    pub stats: FileStat,
    pub changes: u64,
    pub label: Label,
}

/// Weighted change count of `stats` under `policy`.
///
/// Default lines always count; blank, comment, import and delimiter lines
/// count unless the policy excludes their class.
///
/// # Examples
///
/// ```
/// use prsize_core::{FileStat, LineExclusions};
/// use prsize_difflens::aggregate::count_changes;
/// use prsize_difflens::filter::ExclusionPolicy;
///
/// let mut stats = FileStat::default();
/// stats.additions.default = 3;
/// stats.deletions.comment = 2;
///
/// let all = ExclusionPolicy::default();
/// assert_eq!(count_changes(&stats, &all), 5);
///
/// let lines = LineExclusions { comments: true, ..Default::default() };
/// let no_comments = ExclusionPolicy::new(&[] as &[&str], lines).unwrap();
/// assert_eq!(count_changes(&stats, &no_comments), 3);
/// ```
pub fn count_changes(stats: &FileStat, policy: &ExclusionPolicy) -> u64 {
    LineClass::ALL
        .iter()
        .filter(|class| !policy.excludes_class(**class))
        .map(|class| stats.both(*class))
        .sum()
}

/// Sum every file's stats, count changes and pick the label.
///
/// The sum starts from an all-zero stat, so an empty slice selects the
/// smallest label. Pure: equal inputs always give equal results.
pub fn aggregate(file_stats: &[FileStat], policy: &ExclusionPolicy, labels: &LabelTable) -> AggregateResult {
    let stats: FileStat = file_stats.iter().sum();
    let changes = count_changes(&stats, policy);
    let label = labels.select(changes).clone();

    tracing::debug!(files = file_stats.len(), changes, label = %label.name, "change set aggregated");

    AggregateResult {
        stats,
        changes,
        label,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prsize_core::{ClassHistogram, LineExclusions};

    fn hist(default: u64, blank: u64, import: u64, comment: u64, delimiter: u64) -> ClassHistogram {
        ClassHistogram {
            default,
            blank,
            import,
            comment,
            delimiter,
        }
    }

    fn labels() -> LabelTable {
        LabelTable::new(vec![
            Label::bounded("XS", 16),
            Label::bounded("S", 64),
            Label::unbounded("L"),
        ])
        .unwrap()
    }

    fn excluding(lines: LineExclusions) -> ExclusionPolicy {
        ExclusionPolicy::new(&[] as &[&str], lines).unwrap()
    }

    fn sample() -> Vec<FileStat> {
        vec![
            FileStat {
                additions: hist(10, 2, 3, 4, 1),
                deletions: hist(5, 1, 0, 2, 0),
            },
            FileStat {
                additions: hist(20, 0, 1, 0, 2),
                deletions: hist(0, 3, 1, 1, 0),
            },
        ]
    }

    #[test]
    fn sums_field_wise() {
        let result = aggregate(&sample(), &ExclusionPolicy::default(), &labels());
        assert_eq!(result.stats.additions, hist(30, 2, 4, 4, 3));
        assert_eq!(result.stats.deletions, hist(5, 4, 1, 3, 0));
    }

    #[test]
    fn nothing_excluded_counts_everything() {
        let result = aggregate(&sample(), &ExclusionPolicy::default(), &labels());
        assert_eq!(result.changes, 43 + 13);
        assert_eq!(result.label.name, "S");
    }

    #[test]
    fn excluded_classes_stay_in_histograms() {
        let policy = excluding(LineExclusions {
            blank: true,
            comments: true,
            imports: true,
            delimiters: true,
        });
        let result = aggregate(&sample(), &policy, &labels());
        assert_eq!(result.changes, 35);
        assert_eq!(result.stats.additions.comment, 4);
        assert_eq!(result.label.name, "S");
    }

    #[test]
    fn each_flag_removes_only_its_class() {
        let stats: Vec<FileStat> = sample();
        let base = aggregate(&stats, &ExclusionPolicy::default(), &labels()).changes;
        let total: FileStat = stats.iter().sum();

        let cases = [
            (LineExclusions { blank: true, ..Default::default() }, LineClass::Blank),
            (LineExclusions { comments: true, ..Default::default() }, LineClass::Comment),
            (LineExclusions { imports: true, ..Default::default() }, LineClass::Import),
            (LineExclusions { delimiters: true, ..Default::default() }, LineClass::Delimiter),
        ];
        for (lines, class) in cases {
            let changes = aggregate(&stats, &excluding(lines), &labels()).changes;
            assert_eq!(changes, base - total.both(class), "{class}");
        }
    }

    #[test]
    fn zero_files_select_smallest_label() {
        let result = aggregate(&[], &ExclusionPolicy::default(), &labels());
        assert_eq!(result.changes, 0);
        assert_eq!(result.label, Label::bounded("XS", 16));
    }

    #[test]
    fn aggregation_is_idempotent() {
        let policy = excluding(LineExclusions {
            comments: true,
            ..Default::default()
        });
        let a = aggregate(&sample(), &policy, &labels());
        let b = aggregate(&sample(), &policy, &labels());
        assert_eq!(a, b);
    }

    #[test]
    fn large_change_falls_through_to_unbounded() {
        let stats = vec![FileStat {
            additions: hist(1000, 0, 0, 0, 0),
            deletions: ClassHistogram::default(),
        }];
        let result = aggregate(&stats, &ExclusionPolicy::default(), &labels());
        assert_eq!(result.label.name, "L");
    }
}
