//! JSON境界
//!
//! DescriptorとResultはエンジン境界をJSONで越える。フィールド名は
//! 安定した識別子であり、互換性の注記なしに改名してはならない:
//! `select`, `with_components`, `without_components`, `filters`,
//! `order_by`, `limit`, `offset` / `rows`, `fields`, `total_count`

use crate::descriptor::QueryDescriptor;
use crate::error::QueryError;
use crate::result::QueryResult;

/// JSON文字列からDescriptorを復元する
///
/// 不正なJSON・負のlimit/offset・スカラー以外のフィルター値は
/// 全てValidationエラーになる
pub fn parse_descriptor(json: &str) -> Result<QueryDescriptor, QueryError> {
    serde_json::from_str(json).map_err(|err| QueryError::Validation(err.to_string()))
}

/// DescriptorをJSON文字列にする
pub fn descriptor_to_json(descriptor: &QueryDescriptor) -> Result<String, QueryError> {
    serde_json::to_string(descriptor).map_err(|err| QueryError::Execution(err.to_string()))
}

/// ResultをJSON文字列にする
pub fn result_to_json(result: &QueryResult) -> Result<String, QueryError> {
    serde_json::to_string(result).map_err(|err| QueryError::Execution(err.to_string()))
}
