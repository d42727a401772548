//! クエリ実行
//!
//! DescriptorをスナップショットとつきあわせてQueryResultに解決する。
//! 同一のWorldに対して同じDescriptorを何度実行しても、行順・値とも
//! 完全に同一の結果になる（購読レジストリの差分検出の前提）。

use std::cmp::Ordering;

use engine_core::EntityId;

use crate::descriptor::{QueryDescriptor, SortDirection};
use crate::error::QueryError;
use crate::filter;
use crate::result::{QueryResult, QueryResultRow};
use crate::snapshot::EntitySnapshot;
use crate::value::FieldValue;

/// Descriptorがスキーマ上の名前だけを参照しているか検証する
///
/// 未知のフィールド・コンポーネント名は黙って無視せず、実行前に
/// エラーとして呼び出し側へ返す
pub fn validate(
    descriptor: &QueryDescriptor,
    snapshot: &dyn EntitySnapshot,
) -> Result<(), QueryError> {
    for name in descriptor
        .with_components
        .iter()
        .chain(&descriptor.without_components)
    {
        if !snapshot.knows_component(name) {
            return Err(QueryError::UnknownComponent(name.clone()));
        }
    }

    for field in &descriptor.select {
        if !snapshot.knows_field(field) {
            return Err(QueryError::UnknownField(field.clone()));
        }
    }
    for expr in &descriptor.filters {
        if !snapshot.knows_field(&expr.field) {
            return Err(QueryError::UnknownField(expr.field.clone()));
        }
    }
    if let Some(order) = &descriptor.order_by {
        if !snapshot.knows_field(&order.field) {
            return Err(QueryError::UnknownField(order.field.clone()));
        }
    }

    Ok(())
}

/// クエリを実行する
pub fn execute(
    descriptor: &QueryDescriptor,
    snapshot: &dyn EntitySnapshot,
) -> Result<QueryResult, QueryError> {
    validate(descriptor, snapshot)?;

    // with ∩ without ≠ ∅ は充足不能。エラーではなく空結果
    if descriptor.is_unsatisfiable() {
        return Ok(QueryResult::empty());
    }

    // 1. 候補集合: 必須コンポーネントを全て持ち、除外コンポーネントを
    //    1つも持たない生存Entity。列挙順 = 生成順
    // 2. フィルターをAND評価。Entityごとに最初の不成立で打ち切る
    let mut matched: Vec<EntityId> = snapshot
        .entities()
        .into_iter()
        .filter(|&entity| {
            descriptor
                .with_components
                .iter()
                .all(|name| snapshot.has_component(entity, name))
                && !descriptor
                    .without_components
                    .iter()
                    .any(|name| snapshot.has_component(entity, name))
                && descriptor.filters.iter().all(|expr| {
                    filter::evaluate(snapshot.field(entity, &expr.field).as_ref(), expr)
                })
        })
        .collect();

    // 3. 総件数はページング適用前に確定する
    let total_count = matched.len();

    // 4. ソート。安定ソートなので同順位のEntityは生成順を保つ
    if let Some(order) = &descriptor.order_by {
        let mut keyed: Vec<(Option<FieldValue>, EntityId)> = matched
            .into_iter()
            .map(|entity| (snapshot.field(entity, &order.field), entity))
            .collect();

        keyed.sort_by(|(a, _), (b, _)| match (a, b) {
            (Some(a), Some(b)) => {
                let ordering = compare_sort_keys(a, b);
                match order.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            }
            // ソートフィールドを持たないEntityは方向に関わらず末尾
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });

        matched = keyed.into_iter().map(|(_, entity)| entity).collect();
    }

    // 5. offsetで読み飛ばし、limitで打ち切る
    // 6. selectされたフィールドのうちEntityが実際に持つものだけを射影
    let rows: Vec<QueryResultRow> = matched
        .into_iter()
        .skip(descriptor.offset)
        .take(descriptor.limit.unwrap_or(usize::MAX))
        .map(|entity| {
            let mut row = QueryResultRow::new(entity.to_u32());
            for field in &descriptor.select {
                if let Some(value) = snapshot.field(entity, field) {
                    row.set_field(field.clone(), value);
                }
            }
            row
        })
        .collect();

    Ok(QueryResult { rows, total_count })
}

/// ソートキーの比較
///
/// 数値は数値順、文字列は辞書順。型が混在するペアは順序を定めず
/// Equalを返す（安定ソートが生成順を保つ）。NaNもEqual扱い
fn compare_sort_keys(a: &FieldValue, b: &FieldValue) -> Ordering {
    match (a, b) {
        (FieldValue::Number(a), FieldValue::Number(b)) => {
            a.partial_cmp(b).unwrap_or(Ordering::Equal)
        }
        (FieldValue::String(a), FieldValue::String(b)) => a.cmp(b),
        _ => Ordering::Equal,
    }
}
