//! クエリエンジンのエラー型

use thiserror::Error;

/// クエリ操作で発生しうるエラー
///
/// `Validation` と `UnknownField` / `UnknownComponent` は `execute` /
/// `subscribe` の呼び出し時に同期的に返り、操作を中断する。購読の
/// 定期再評価中に発生した `Execution` はスイープを止めず、直前の
/// キャッシュ済み結果が保持される。
#[derive(Debug, Error)]
pub enum QueryError {
    /// Descriptorの形式不正（不正なJSON、負のlimit/offsetなど）
    #[error("invalid descriptor: {0}")]
    Validation(String),

    /// スキーマに存在しないフィールドへの参照
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// スキーマに存在しないコンポーネントへの参照
    #[error("unknown component: {0}")]
    UnknownComponent(String),

    /// 評価中の内部エラー（ストアアクセス失敗、シリアライズ失敗など）
    #[error("query execution failed: {0}")]
    Execution(String),

    /// エンジンが要求を受け付けられる状態にない
    #[error("engine is not ready")]
    NotReady,
}
