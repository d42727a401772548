//! ストア境界
//!
//! クエリエンジンは [`EntitySnapshot`] を通してのみストアを読む。
//! 実装側の義務:
//! - `entities()` は生存Entityを生成順で返し、Worldが変化しない限り
//!   繰り返し呼んでも同じ列を返すこと（購読の差分検出が行順に依存する）
//! - 返した値への参照を呼び出し1回の範囲を越えて保持しないこと

use engine_core::{EntityId, Name, Transform, World};

use crate::value::FieldValue;

/// 1tick分の読み取り専用スナップショットへのアクセサ
pub trait EntitySnapshot {
    /// 生存Entityを生成順で列挙する
    fn entities(&self) -> Vec<EntityId>;

    /// 指定Entityが名前付きコンポーネントを持つか
    fn has_component(&self, entity: EntityId, name: &str) -> bool;

    /// フィールド値を取得する。欠損時はNone
    fn field(&self, entity: EntityId, name: &str) -> Option<FieldValue>;

    /// コンポーネント名がスキーマに存在するか
    fn knows_component(&self, name: &str) -> bool;

    /// フィールド名がスキーマに存在するか
    fn knows_field(&self, name: &str) -> bool;
}

/// Worldが公開するコンポーネント名
const KNOWN_COMPONENTS: &[&str] = &["Transform", "Name"];

/// Worldが公開するスカラーフィールドパス
///
/// 複合値（position全体など）は公開しない。常にドット区切りの
/// スカラーパスで参照する
const KNOWN_FIELDS: &[&str] = &[
    "id",
    "name",
    "position.x",
    "position.y",
    "position.z",
    "rotation.x",
    "rotation.y",
    "rotation.z",
    "rotation.w",
    "scale.x",
    "scale.y",
    "scale.z",
];

impl EntitySnapshot for World {
    fn entities(&self) -> Vec<EntityId> {
        self.iter_entities().collect()
    }

    fn has_component(&self, entity: EntityId, name: &str) -> bool {
        match name {
            "Transform" => self.has::<Transform>(entity),
            "Name" => self.has::<Name>(entity),
            _ => false,
        }
    }

    fn field(&self, entity: EntityId, name: &str) -> Option<FieldValue> {
        match name {
            "id" => Some(FieldValue::Number(entity.to_u32() as f64)),
            "name" => self
                .get::<Name>(entity)
                .map(|n| FieldValue::from(n.as_str())),
            "position.x" => self
                .get::<Transform>(entity)
                .map(|t| FieldValue::from(t.position.x)),
            "position.y" => self
                .get::<Transform>(entity)
                .map(|t| FieldValue::from(t.position.y)),
            "position.z" => self
                .get::<Transform>(entity)
                .map(|t| FieldValue::from(t.position.z)),
            "rotation.x" => self
                .get::<Transform>(entity)
                .map(|t| FieldValue::from(t.rotation.x)),
            "rotation.y" => self
                .get::<Transform>(entity)
                .map(|t| FieldValue::from(t.rotation.y)),
            "rotation.z" => self
                .get::<Transform>(entity)
                .map(|t| FieldValue::from(t.rotation.z)),
            "rotation.w" => self
                .get::<Transform>(entity)
                .map(|t| FieldValue::from(t.rotation.w)),
            "scale.x" => self
                .get::<Transform>(entity)
                .map(|t| FieldValue::from(t.scale.x)),
            "scale.y" => self
                .get::<Transform>(entity)
                .map(|t| FieldValue::from(t.scale.y)),
            "scale.z" => self
                .get::<Transform>(entity)
                .map(|t| FieldValue::from(t.scale.z)),
            _ => None,
        }
    }

    fn knows_component(&self, name: &str) -> bool {
        KNOWN_COMPONENTS.contains(&name)
    }

    fn knows_field(&self, name: &str) -> bool {
        KNOWN_FIELDS.contains(&name)
    }
}
