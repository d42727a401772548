//! フィルター評価
//!
//! 単一のフィルター式をフィールド値（欠損の可能性あり）に適用する。
//! 評価は全域的で、決して失敗しない。異種混在のEntity集合に対して
//! Executorが中断なしに走り切れることを保証する。

use crate::descriptor::FilterExpr;
use crate::value::{CompareOp, FieldValue};

/// フィルター式を評価する
///
/// - フィールド欠損時は `== null` のみ真。`!= null` を含む他の全演算子は偽
///   （欠損フィールドがnull等価テスト以外を満たすことはない）
/// - フィールドが存在する場合は [`CompareOp::compare_values`] の型別規則に従う
pub fn evaluate(field: Option<&FieldValue>, expr: &FilterExpr) -> bool {
    match field {
        None => expr.op == CompareOp::Eq && expr.value.is_null(),
        Some(value) => expr.op.compare_values(value, &expr.value),
    }
}
