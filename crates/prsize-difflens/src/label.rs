//! Label threshold table and selection.

use std::fmt;

use prsize_core::{Label, PrsizeError};
use serde::Serialize;

/// A validated label table, sorted by ascending `max_changes` with the single
/// unbounded label last.
///
/// # Examples
///
/// ```
/// use prsize_core::Label;
/// use prsize_difflens::label::LabelTable;
///
/// let table = LabelTable::new(vec![
///     Label::unbounded("L"),
///     Label::bounded("S", 64),
///     Label::bounded("XS", 16),
/// ])
/// .unwrap();
/// assert_eq!(table.select(0).name, "XS");
/// assert_eq!(table.select(64).name, "S");
/// assert_eq!(table.select(65).name, "L");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelTable {
    labels: Vec<Label>,
}

impl LabelTable {
    /// Sort and validate a label set.
    ///
    /// # Errors
    ///
    /// Returns [`PrsizeError::InvalidLabelTable`] if the set is empty, has no
    /// unbounded label, or has more than one.
    pub fn new(mut labels: Vec<Label>) -> Result<Self, PrsizeError> {
        if labels.is_empty() {
            return Err(PrsizeError::InvalidLabelTable("no labels configured".into()));
        }

        let unbounded: Vec<&str> = labels
            .iter()
            .filter(|l| l.max_changes.is_none())
            .map(|l| l.name.as_str())
            .collect();
        match unbounded.len() {
            0 => {
                return Err(PrsizeError::InvalidLabelTable(
                    "no unbounded label to catch the largest changes".into(),
                ))
            }
            1 => {}
            _ => {
                return Err(PrsizeError::InvalidLabelTable(format!(
                    "{} unbounded labels: {}",
                    unbounded.len(),
                    unbounded.join(", ")
                )))
            }
        }

        labels.sort_by_key(|l| (l.max_changes.is_none(), l.max_changes));
        Ok(Self { labels })
    }

    /// Labels in ascending order.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// First label whose bound is absent or at least `changes`.
    pub fn select(&self, changes: u64) -> &Label {
        &self.labels[self.select_index(changes)]
    }

    /// Index of [`LabelTable::select`]'s result in ascending order.
    pub fn select_index(&self, changes: u64) -> usize {
        self.labels
            .iter()
            .position(|l| l.covers(changes))
            .unwrap_or(self.labels.len() - 1)
    }

    /// Whether `name` is one of this table's labels.
    pub fn contains(&self, name: &str) -> bool {
        self.labels.iter().any(|l| l.name == name)
    }

    /// Work out how a change's current labels must move to carry only
    /// `selected` out of this table. Labels not in the table are left alone.
    ///
    /// # Examples
    ///
    /// ```
    /// use prsize_core::PrsizeConfig;
    /// use prsize_difflens::label::LabelTable;
    ///
    /// let table = LabelTable::new(PrsizeConfig::default_labels()).unwrap();
    /// let current = vec!["Small".to_string(), "bug".to_string()];
    /// let plan = table.plan_update(&current, table.select(100));
    /// assert_eq!(plan.add.as_deref(), Some("Medium"));
    /// assert_eq!(plan.remove, vec!["Small".to_string()]);
    /// ```
    pub fn plan_update(&self, current: &[String], selected: &Label) -> LabelPlan {
        let remove = current
            .iter()
            .filter(|name| **name != selected.name && self.contains(name))
            .cloned()
            .collect();
        let add = if current.iter().any(|name| *name == selected.name) {
            None
        } else {
            Some(selected.name.clone())
        };
        LabelPlan { add, remove }
    }
}

impl fmt::Display for LabelTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<24} {:>12}", "Label", "Max changes")?;
        writeln!(f, "{}", "-".repeat(37))?;
        for label in &self.labels {
            match label.max_changes {
                Some(max) => writeln!(f, "{:<24} {:>12}", label.name, max)?,
                None => writeln!(f, "{:<24} {:>12}", label.name, "-")?,
            }
        }
        Ok(())
    }
}

/// Label changes needed to bring a change in line with its measured size.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelPlan {
    /// Label to add, unless already present.
    pub add: Option<String>,
    /// Stale size labels to remove.
    pub remove: Vec<String>,
}

impl LabelPlan {
    pub fn is_noop(&self) -> bool {
        self.add.is_none() && self.remove.is_empty()
    }
}
