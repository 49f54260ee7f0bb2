//! Textual SQL feature detection.
//!
//! Everything downstream keys off substring and word-boundary counts over an
//! uppercased copy of the statement. Two join counts exist on purpose: the
//! scorer counts the `JOIN` keyword at word boundaries, while the heuristic
//! time multipliers count the raw substring (so `CROSS JOIN` and dialect
//! variants all weigh in).

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static WORD_JOIN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bJOIN\b").unwrap());
static WINDOW_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bOVER\s*\(").unwrap());

/// A statement folded to uppercase once, with the counts the estimator needs.
#[derive(Debug, Clone)]
pub struct SqlText {
    upper: String,
}

impl SqlText {
    pub fn new(sql: &str) -> Self {
        Self {
            upper: sql.to_uppercase(),
        }
    }

    pub fn len(&self) -> usize {
        self.upper.len()
    }

    pub fn is_empty(&self) -> bool {
        self.upper.is_empty()
    }

    /// Case-folded substring presence.
    pub fn contains(&self, keyword: &str) -> bool {
        self.upper.contains(keyword)
    }

    /// Non-overlapping substring occurrences.
    pub fn count(&self, keyword: &str) -> usize {
        self.upper.matches(keyword).count()
    }

    /// `JOIN` as a standalone keyword (a column named `JOINED` does not count).
    pub fn word_join_count(&self) -> usize {
        WORD_JOIN_RE.find_iter(&self.upper).count()
    }

    /// Raw `JOIN` substring occurrences, dialect prefixes included.
    pub fn raw_join_count(&self) -> usize {
        self.count("JOIN")
    }

    pub fn cross_join_count(&self) -> usize {
        self.count("CROSS JOIN")
    }

    /// Window functions. Gated on the plain `OVER (`/`OVER(` spellings first,
    /// matching how the figure has always been counted.
    pub fn window_count(&self) -> usize {
        if self.contains("OVER (") || self.contains("OVER(") {
            WINDOW_RE.find_iter(&self.upper).count()
        } else {
            0
        }
    }

    pub fn select_count(&self) -> usize {
        self.count("SELECT")
    }

    /// `WITH ` occurrences; each CTE block opens with one.
    pub fn cte_count(&self) -> usize {
        self.count("WITH ")
    }

    pub fn order_by_count(&self) -> usize {
        self.count("ORDER BY")
    }

    pub fn has_group_by(&self) -> bool {
        self.contains("GROUP BY")
    }

    pub fn has_distinct(&self) -> bool {
        self.contains("DISTINCT")
    }
}

/// Feature summary for reporting (the deep-dive view renders this).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlFeatures {
    pub length: usize,
    pub joins: usize,
    pub cross_joins: usize,
    pub windows: usize,
    pub subqueries: usize,
    pub ctes: usize,
    pub order_bys: usize,
    pub group_by: bool,
    pub distinct: bool,
}

impl SqlFeatures {
    pub fn extract(sql: &SqlText) -> Self {
        Self {
            length: sql.len(),
            joins: sql.word_join_count(),
            cross_joins: sql.cross_join_count(),
            windows: sql.window_count(),
            subqueries: sql.select_count().saturating_sub(1),
            ctes: sql.cte_count(),
            order_bys: sql.order_by_count(),
            group_by: sql.has_group_by(),
            distinct: sql.has_distinct(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_counting_is_word_bounded() {
        let sql = SqlText::new("select joined_at from t1 join t2 on t1.id = t2.id");
        assert_eq!(sql.word_join_count(), 1);
        // The raw count sees the substring inside `joined_at` too.
        assert_eq!(sql.raw_join_count(), 2);
    }

    #[test]
    fn cross_join_is_also_a_join() {
        let sql = SqlText::new("SELECT * FROM a CROSS JOIN b");
        assert_eq!(sql.cross_join_count(), 1);
        assert_eq!(sql.word_join_count(), 1);
    }

    #[test]
    fn window_gate_requires_plain_spelling() {
        assert_eq!(
            SqlText::new("SELECT RANK() OVER (ORDER BY x) FROM t").window_count(),
            1
        );
        assert_eq!(
            SqlText::new("SELECT RANK() OVER(ORDER BY x) FROM t").window_count(),
            1
        );
        // A column named OVERAGE is not a window.
        assert_eq!(SqlText::new("SELECT overage FROM t").window_count(), 0);
    }

    #[test]
    fn counts_on_empty_text() {
        let sql = SqlText::new("");
        assert!(sql.is_empty());
        assert_eq!(sql.select_count(), 0);
        assert_eq!(sql.word_join_count(), 0);
    }

    #[test]
    fn features_summary() {
        let sql = SqlText::new(
            "WITH base AS (SELECT DISTINCT id FROM t1 JOIN t2 ON t1.id = t2.id) \
             SELECT id, COUNT(*) FROM base GROUP BY id ORDER BY id",
        );
        let features = SqlFeatures::extract(&sql);
        assert_eq!(features.joins, 1);
        assert_eq!(features.ctes, 1);
        assert_eq!(features.subqueries, 1);
        assert_eq!(features.order_bys, 1);
        assert!(features.group_by);
        assert!(features.distinct);
    }
}
