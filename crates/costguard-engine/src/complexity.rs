//! Structural complexity scoring.
//!
//! Additive score over textual features, clamped to 0..=100. The absolute
//! numbers matter less than the ordering: a statement with more joins,
//! windows, and nesting must never score below a simpler one.

use crate::sql::SqlText;

/// Keywords that each add a flat amount when present at all.
const AGG_KEYWORDS: [&str; 6] = ["COUNT", "SUM", "AVG", "MAX", "MIN", "GROUP BY"];

/// Base score for any statement.
const BASE_SCORE: i64 = 10;

/// Score a statement's structural complexity.
///
/// Terms: joins at 10 points each (capped at 30), each aggregation keyword
/// present at 5, window functions at 8 each (capped at 24), subqueries at 5
/// each (capped at 20), `DISTINCT` at 5, CTEs at 3 each (capped at 10).
pub fn complexity_score(sql: &SqlText) -> u8 {
    let mut score = BASE_SCORE;

    score += (sql.word_join_count() as i64 * 10).min(30);

    for keyword in AGG_KEYWORDS {
        if sql.contains(keyword) {
            score += 5;
        }
    }

    score += (sql.window_count() as i64 * 8).min(24);

    // Every SELECT beyond the first is a subquery. An empty statement has
    // none at all and lands below the base score.
    let subqueries = sql.select_count() as i64 - 1;
    score += (subqueries * 5).min(20);

    if sql.has_distinct() {
        score += 5;
    }

    score += (sql.cte_count() as i64 * 3).min(10);

    score.clamp(0, 100) as u8
}
