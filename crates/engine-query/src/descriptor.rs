//! クエリ定義（Descriptor）
//!
//! 一度構築したDescriptorは不変の値として扱う。構築には
//! [`QueryBuilder`](crate::builder::QueryBuilder) を使う。

use serde::{Deserialize, Serialize};

use crate::value::{CompareOp, FieldValue};

// ============================================================================
// FilterExpr - フィルター式
// ============================================================================

/// フィルター式
///
/// 複数のフィルターは常にAND結合で評価される。OR・グループ化は
/// サポートしない。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterExpr {
    /// フィールド名 (e.g., "name", "position.x")
    pub field: String,

    /// 比較演算子
    pub op: CompareOp,

    /// 比較値
    pub value: FieldValue,
}

impl FilterExpr {
    /// 新しいフィルター式を作成
    pub fn new(field: impl Into<String>, op: CompareOp, value: impl Into<FieldValue>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// 等価フィルター (field == value)
    pub fn eq(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(field, CompareOp::Eq, value)
    }

    /// 不等価フィルター (field != value)
    pub fn ne(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(field, CompareOp::Ne, value)
    }

    /// より小さいフィルター (field < value)
    pub fn lt(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(field, CompareOp::Lt, value)
    }

    /// 以下フィルター (field <= value)
    pub fn le(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(field, CompareOp::Le, value)
    }

    /// より大きいフィルター (field > value)
    pub fn gt(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(field, CompareOp::Gt, value)
    }

    /// 以上フィルター (field >= value)
    pub fn ge(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(field, CompareOp::Ge, value)
    }
}

// ============================================================================
// SortDirection & OrderBy - ソート
// ============================================================================

/// ソート方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl Default for SortDirection {
    fn default() -> Self {
        SortDirection::Asc
    }
}

/// ソート条件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    /// ソート対象フィールド
    pub field: String,
    /// ソート方向（省略時は昇順）
    #[serde(default)]
    pub direction: SortDirection,
}

impl OrderBy {
    /// 昇順ソート
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    /// 降順ソート
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

// ============================================================================
// QueryDescriptor - クエリ定義
// ============================================================================

/// クエリ定義
///
/// `with_components` と `without_components` が交差する場合、そのクエリは
/// 充足不能とみなされ、エラーではなく空の結果を返す。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryDescriptor {
    /// 取得するフィールド名 (e.g., ["name", "position.x"])
    pub select: Vec<String>,

    /// 必須コンポーネント (e.g., ["Transform"])
    pub with_components: Vec<String>,

    /// 除外コンポーネント (e.g., ["Name"])
    pub without_components: Vec<String>,

    /// フィルター条件（AND結合）
    pub filters: Vec<FilterExpr>,

    /// ソート条件
    pub order_by: Option<OrderBy>,

    /// 取得上限（Noneは無制限）
    pub limit: Option<usize>,

    /// 先頭から読み飛ばす件数
    pub offset: usize,
}

impl QueryDescriptor {
    /// 空のクエリを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// `with_components` と `without_components` が交差しているか
    ///
    /// 交差するクエリはどのEntityにもマッチしない
    pub fn is_unsatisfiable(&self) -> bool {
        self.with_components
            .iter()
            .any(|name| self.without_components.contains(name))
    }
}
