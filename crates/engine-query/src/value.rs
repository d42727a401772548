//! フィールド値と比較演算子

use serde::{Deserialize, Serialize};

// ============================================================================
// FieldValue - フィールド値
// ============================================================================

/// フィルター・結果行で使用可能なスカラー値
///
/// オブジェクトや配列は境界で受け付けない。複合的な値は
/// `position.x` のようなドット区切りのスカラーパスで参照する。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    String(String),
    Bool(bool),
    Null,
}

impl FieldValue {
    /// f64として取得
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// 文字列として取得
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// boolとして取得
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Nullかどうか
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<f32> for FieldValue {
    fn from(n: f32) -> Self {
        FieldValue::Number(n as f64)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

// ============================================================================
// CompareOp - 比較演算子
// ============================================================================

/// 比較演算子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    /// 等しい (==)
    #[serde(rename = "==")]
    Eq,

    /// 等しくない (!=)
    #[serde(rename = "!=")]
    Ne,

    /// より小さい (<)
    #[serde(rename = "<")]
    Lt,

    /// 以下 (<=)
    #[serde(rename = "<=")]
    Le,

    /// より大きい (>)
    #[serde(rename = ">")]
    Gt,

    /// 以上 (>=)
    #[serde(rename = ">=")]
    Ge,
}

impl CompareOp {
    /// 2つの値を比較する
    pub fn compare<T: PartialOrd>(&self, left: &T, right: &T) -> bool {
        match self {
            CompareOp::Eq => left == right,
            CompareOp::Ne => left != right,
            CompareOp::Lt => left < right,
            CompareOp::Le => left <= right,
            CompareOp::Gt => left > right,
            CompareOp::Ge => left >= right,
        }
    }

    /// FieldValue同士の比較
    ///
    /// - 数値: f64比較（NaNはIEEE-754に従い、順序比較は常に偽、`!=`のみ真）
    /// - 文字列: `==`/`!=`は完全一致、順序比較は大文字小文字を区別する辞書順
    /// - bool: `==`/`!=`のみサポート、順序比較は常に偽
    /// - Null同士: `==`のみ真
    /// - 型が異なる場合は全演算子で偽
    pub fn compare_values(&self, left: &FieldValue, right: &FieldValue) -> bool {
        match (left, right) {
            (FieldValue::Number(l), FieldValue::Number(r)) => self.compare(l, r),
            (FieldValue::String(l), FieldValue::String(r)) => self.compare(l, r),
            (FieldValue::Bool(l), FieldValue::Bool(r)) => match self {
                CompareOp::Eq => l == r,
                CompareOp::Ne => l != r,
                _ => false,
            },
            (FieldValue::Null, FieldValue::Null) => matches!(self, CompareOp::Eq),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_op_numbers() {
        assert!(CompareOp::Eq.compare(&5, &5));
        assert!(!CompareOp::Eq.compare(&5, &6));
        assert!(CompareOp::Ne.compare(&5, &6));
        assert!(CompareOp::Lt.compare(&5, &6));
        assert!(CompareOp::Le.compare(&5, &5));
        assert!(CompareOp::Gt.compare(&6, &5));
        assert!(CompareOp::Ge.compare(&5, &5));
    }

    #[test]
    fn test_compare_op_serialize() {
        let op = CompareOp::Lt;
        let json = serde_json::to_string(&op).unwrap();
        assert_eq!(json, r#""<""#);

        let op: CompareOp = serde_json::from_str(r#""<=""#).unwrap();
        assert_eq!(op, CompareOp::Le);
    }

    #[test]
    fn test_compare_values_numbers() {
        let a = FieldValue::Number(5.0);
        let b = FieldValue::Number(10.0);
        assert!(CompareOp::Lt.compare_values(&a, &b));
        assert!(!CompareOp::Gt.compare_values(&a, &b));
    }

    #[test]
    fn test_compare_values_strings_case_sensitive() {
        let s1 = FieldValue::String("abc".to_string());
        let s2 = FieldValue::String("def".to_string());
        assert!(CompareOp::Lt.compare_values(&s1, &s2));

        // 大文字は小文字より前（バイト順）
        let upper = FieldValue::String("Zebra".to_string());
        let lower = FieldValue::String("apple".to_string());
        assert!(CompareOp::Lt.compare_values(&upper, &lower));
        assert!(!CompareOp::Eq.compare_values(&upper, &lower));
    }

    #[test]
    fn test_compare_values_type_mismatch_is_false() {
        let n = FieldValue::Number(1.0);
        let s = FieldValue::String("1".to_string());
        for op in [
            CompareOp::Eq,
            CompareOp::Ne,
            CompareOp::Lt,
            CompareOp::Le,
            CompareOp::Gt,
            CompareOp::Ge,
        ] {
            assert!(!op.compare_values(&n, &s));
        }
    }

    #[test]
    fn test_compare_values_bool_supports_equality_only() {
        let t = FieldValue::Bool(true);
        let f = FieldValue::Bool(false);
        assert!(CompareOp::Eq.compare_values(&t, &t));
        assert!(CompareOp::Ne.compare_values(&t, &f));
        assert!(!CompareOp::Lt.compare_values(&f, &t));
        assert!(!CompareOp::Ge.compare_values(&t, &f));
    }

    #[test]
    fn test_compare_values_null() {
        let null = FieldValue::Null;
        assert!(CompareOp::Eq.compare_values(&null, &null));
        assert!(!CompareOp::Ne.compare_values(&null, &null));
        assert!(!CompareOp::Le.compare_values(&null, &null));

        // Nullと他の型の比較は常に偽
        let n = FieldValue::Number(0.0);
        assert!(!CompareOp::Eq.compare_values(&n, &null));
        assert!(!CompareOp::Ne.compare_values(&n, &null));
    }

    #[test]
    fn test_compare_values_nan_follows_ieee() {
        let nan = FieldValue::Number(f64::NAN);
        let one = FieldValue::Number(1.0);
        assert!(!CompareOp::Eq.compare_values(&nan, &nan));
        assert!(CompareOp::Ne.compare_values(&nan, &nan));
        assert!(!CompareOp::Lt.compare_values(&nan, &one));
        assert!(!CompareOp::Gt.compare_values(&nan, &one));
        assert!(!CompareOp::Le.compare_values(&one, &nan));
    }

    #[test]
    fn test_field_value_accessors() {
        let num = FieldValue::Number(42.0);
        assert_eq!(num.as_f64(), Some(42.0));
        assert_eq!(num.as_str(), None);

        let s = FieldValue::String("hello".to_string());
        assert_eq!(s.as_str(), Some("hello"));
        assert_eq!(s.as_f64(), None);

        let b = FieldValue::Bool(true);
        assert_eq!(b.as_bool(), Some(true));

        assert!(FieldValue::Null.is_null());
    }

    #[test]
    fn test_field_value_serialize_untagged() {
        assert_eq!(
            serde_json::to_string(&FieldValue::Number(42.0)).unwrap(),
            "42.0"
        );
        assert_eq!(
            serde_json::to_string(&FieldValue::String("hello".to_string())).unwrap(),
            r#""hello""#
        );
        assert_eq!(serde_json::to_string(&FieldValue::Bool(true)).unwrap(), "true");
        assert_eq!(serde_json::to_string(&FieldValue::Null).unwrap(), "null");
    }

    #[test]
    fn test_field_value_deserialize_integer_as_number() {
        let v: FieldValue = serde_json::from_str("5").unwrap();
        assert_eq!(v, FieldValue::Number(5.0));
    }
}
