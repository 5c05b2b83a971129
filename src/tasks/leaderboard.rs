use std::cmp::Ordering;
use std::fmt;

use crate::service::ModelKind;

/// In-sample and out-of-sample deviance of one fitted model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub label: String,
    pub model_kind: ModelKind,
    pub train_deviance: f64,
    pub test_deviance: f64,
}

/// Evaluations ordered by ascending test deviance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    entries: Vec<Evaluation>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Leaderboard::default()
    }

    pub fn push(&mut self, evaluation: Evaluation) {
        let pos = self
            .entries
            .iter()
            .position(|e| compare(&evaluation, e) == Ordering::Less)
            .unwrap_or_else(|| self.entries.len());
        self.entries.insert(pos, evaluation);
    }

    pub fn best(&self) -> Option<&Evaluation> {
        self.entries.first()
    }

    pub fn entries(&self) -> &[Evaluation] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn compare(a: &Evaluation, b: &Evaluation) -> Ordering {
    a.test_deviance
        .partial_cmp(&b.test_deviance)
        .unwrap_or(Ordering::Equal)
}

impl Extend<Evaluation> for Leaderboard {
    fn extend<I: IntoIterator<Item = Evaluation>>(&mut self, iter: I) {
        for e in iter {
            self.push(e);
        }
    }
}

impl fmt::Display for Leaderboard {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let width = self
            .entries
            .iter()
            .map(|e| e.label.len())
            .max()
            .unwrap_or(0)
            .max("model".len());

        writeln!(f, "{:<w$}  {:>12}  {:>12}", "model", "train", "test", w = width)?;
        for e in &self.entries {
            writeln!(
                f,
                "{:<w$}  {:>12.6}  {:>12.6}",
                e.label,
                e.train_deviance,
                e.test_deviance,
                w = width
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
fn entry(label: &str, test_deviance: f64) -> Evaluation {
    Evaluation {
        label: label.to_owned(),
        model_kind: ModelKind::Glm,
        train_deviance: 0.3,
        test_deviance,
    }
}

#[test]
fn sorted_by_test_deviance() {
    let mut board = Leaderboard::new();
    board.extend(vec![entry("b", 0.32), entry("a", 0.31), entry("c", 0.33), entry("d", 0.31)]);

    let labels: Vec<_> = board.entries().iter().map(|e| e.label.as_str()).collect();
    assert_eq!(labels, vec!["a", "d", "b", "c"]);
    assert_eq!(board.best().map(|e| e.label.as_str()), Some("a"));
}

#[test]
fn table_layout() {
    let mut board = Leaderboard::new();
    board.push(entry("glm", 0.25));

    let table = board.to_string();
    let lines: Vec<_> = table.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("model"));
    assert!(lines[1].starts_with("glm"));
    assert!(lines[1].ends_with("0.250000"));
}
