//! クエリ結果

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::value::FieldValue;

/// クエリ結果の1行
///
/// `fields` にはselectで指定され、かつそのEntityが実際に持っている
/// フィールドのみが現れる。欠損フィールドはキーごと省略される。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResultRow {
    /// EntityId（packed u32形式）
    pub id: u32,

    /// 選択されたフィールドの値
    pub fields: HashMap<String, FieldValue>,
}

impl QueryResultRow {
    /// 新しい結果行を作成
    pub fn new(id: u32) -> Self {
        Self {
            id,
            fields: HashMap::new(),
        }
    }

    /// フィールドを設定
    pub fn set_field(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }

    /// フィールド値を取得
    pub fn get_field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }
}

/// クエリ実行結果
///
/// 構築後は不変のスナップショット。`PartialEq` がそのまま購読レジストリの
/// 変更検出になる: total_countと行Id列は順序込み、行内のフィールドは
/// 順序なしで比較される。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// 結果の行（ソート・ページング適用後）
    pub rows: Vec<QueryResultRow>,

    /// ページング適用前の総件数
    pub total_count: usize,
}

impl QueryResult {
    /// 空の結果を作成
    pub fn empty() -> Self {
        Self::default()
    }

    /// 結果行数
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// 結果が空かどうか
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// イテレータを取得
    pub fn iter(&self) -> impl Iterator<Item = &QueryResultRow> {
        self.rows.iter()
    }
}
