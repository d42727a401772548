//! クエリ購読管理
//!
//! 登録されたクエリをtickごとに再評価し、結果が構造的に変化した
//! 購読にだけコールバックを配信する。

use std::collections::HashMap;

use crate::descriptor::QueryDescriptor;
use crate::error::QueryError;
use crate::executor;
use crate::result::QueryResult;
use crate::snapshot::EntitySnapshot;

/// 購読Id
///
/// レジストリの生存期間内で単調増加し、解除後も再利用されない。
/// 古いIdによる遅延unsubscribeが後続の別購読を誤って解除することはない
pub type SubscriptionId = u32;

/// 結果配信コールバック
pub type SubscriptionCallback = Box<dyn FnMut(&QueryResult)>;

/// 購読1件分の状態
///
/// ライフサイクルは Created → Active → Cancelled（終端）。
/// Createdは `subscribe` 呼び出し内にのみ存在し、Cancelledは
/// レジストリからの除去として表現される
struct Subscription {
    descriptor: QueryDescriptor,
    callback: SubscriptionCallback,
    /// 前回配信した結果。差分検出に使う
    last_result: QueryResult,
}

/// 購読レジストリ
pub struct SubscriptionRegistry {
    subscriptions: HashMap<SubscriptionId, Subscription>,
    next_id: SubscriptionId,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self {
            subscriptions: HashMap::new(),
            next_id: 1,
        }
    }

    /// クエリを購読する
    ///
    /// その場で一度同期実行し、初回結果をコールバックへ配信してから
    /// Activeとして登録する。検証エラー時は何も登録されない
    pub fn subscribe(
        &mut self,
        descriptor: QueryDescriptor,
        snapshot: &dyn EntitySnapshot,
        mut callback: SubscriptionCallback,
    ) -> Result<SubscriptionId, QueryError> {
        let initial = executor::execute(&descriptor, snapshot)?;

        let id = self.next_id;
        self.next_id += 1;

        callback(&initial);
        self.subscriptions.insert(
            id,
            Subscription {
                descriptor,
                callback,
                last_result: initial,
            },
        );

        log::debug!("subscription {} registered", id);
        Ok(id)
    }

    /// 購読を解除する
    ///
    /// Activeな購読を解除したらtrue。未知のIdや解除済みのIdはfalseを
    /// 返すだけで、エラーにはならない（冪等）
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let removed = self.subscriptions.remove(&id).is_some();
        if removed {
            log::debug!("subscription {} cancelled", id);
        }
        removed
    }

    /// IdがActiveな購読を指しているか
    pub fn is_active(&self, id: SubscriptionId) -> bool {
        self.subscriptions.contains_key(&id)
    }

    /// Activeな購読数
    pub fn active_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// 1tick分の再評価スイープ
    ///
    /// 全Active購読をId昇順に再実行し、キャッシュ済み結果と構造的に
    /// 比較する。変化があった購読だけキャッシュを置き換えて配信する。
    /// 個別の実行エラーはスイープを止めない: 該当購読はキャッシュと
    /// Active状態を保ったままスキップされ、次の購読へ進む
    pub fn evaluate(&mut self, snapshot: &dyn EntitySnapshot) {
        let mut ids: Vec<SubscriptionId> = self.subscriptions.keys().copied().collect();
        ids.sort_unstable();

        for id in ids {
            let Some(subscription) = self.subscriptions.get_mut(&id) else {
                continue;
            };

            match executor::execute(&subscription.descriptor, snapshot) {
                Ok(result) => {
                    if result != subscription.last_result {
                        subscription.last_result = result;
                        (subscription.callback)(&subscription.last_result);
                    }
                }
                Err(err) => {
                    log::warn!("subscription {} re-evaluation failed: {}", id, err);
                }
            }
        }
    }
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use engine_core::{EntityId, Name, Transform, World};
    use glam::Vec3;

    use crate::builder::QueryBuilder;
    use crate::value::FieldValue;

    /// 配信された結果を記録するコールバックを作る
    fn recording_callback(
        log: Rc<RefCell<Vec<QueryResult>>>,
    ) -> SubscriptionCallback {
        Box::new(move |result| log.borrow_mut().push(result.clone()))
    }

    fn transform_query() -> QueryDescriptor {
        QueryBuilder::new()
            .select(["name"])
            .with(["Transform"])
            .build()
    }

    #[test]
    fn test_subscribe_delivers_initial_result() {
        let mut world = World::new();
        let entity = world.spawn();
        world.insert(entity, Name::new("A"));
        world.insert(entity, Transform::identity());

        let mut registry = SubscriptionRegistry::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let id = registry
            .subscribe(transform_query(), &world, recording_callback(log.clone()))
            .unwrap();

        assert!(registry.is_active(id));
        let delivered = log.borrow();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].total_count, 1);
    }

    #[test]
    fn test_failed_subscribe_registers_nothing() {
        let world = World::new();
        let mut registry = SubscriptionRegistry::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let bad = QueryBuilder::new().select(["velocity"]).build();
        let result = registry.subscribe(bad, &world, recording_callback(log.clone()));

        assert!(matches!(result, Err(QueryError::UnknownField(_))));
        assert_eq!(registry.active_count(), 0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_unchanged_world_suppresses_notification() {
        let mut world = World::new();
        let entity = world.spawn();
        world.insert(entity, Name::new("A"));
        world.insert(entity, Transform::identity());

        let mut registry = SubscriptionRegistry::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        registry
            .subscribe(transform_query(), &world, recording_callback(log.clone()))
            .unwrap();

        // Worldが変わらない限り何度スイープしても再配信しない
        registry.evaluate(&world);
        registry.evaluate(&world);
        registry.evaluate(&world);

        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_change_triggers_single_notification() {
        let mut world = World::new();
        let entity = world.spawn();
        world.insert(entity, Name::new("A"));
        world.insert(entity, Transform::identity());

        let mut registry = SubscriptionRegistry::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        registry
            .subscribe(transform_query(), &world, recording_callback(log.clone()))
            .unwrap();

        // 変化: 新しいEntityがマッチ集合に加わる
        let second = world.spawn();
        world.insert(second, Name::new("B"));
        world.insert(second, Transform::identity());

        registry.evaluate(&world);
        assert_eq!(log.borrow().len(), 2);
        assert_eq!(log.borrow()[1].total_count, 2);

        // 再スイープでは変化なし
        registry.evaluate(&world);
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn test_field_value_change_is_detected() {
        let mut world = World::new();
        let entity = world.spawn();
        world.insert(entity, Name::new("A"));
        world.insert(entity, Transform::from_position(Vec3::new(1.0, 0.0, 0.0)));

        let query = QueryBuilder::new()
            .select(["position.x"])
            .with(["Transform"])
            .build();

        let mut registry = SubscriptionRegistry::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        registry
            .subscribe(query, &world, recording_callback(log.clone()))
            .unwrap();

        if let Some(t) = world.get_mut::<Transform>(entity) {
            t.position.x = 9.0;
        }

        registry.evaluate(&world);
        let delivered = log.borrow();
        assert_eq!(delivered.len(), 2);
        assert_eq!(
            delivered[1].rows[0].get_field("position.x"),
            Some(&FieldValue::Number(9.0))
        );
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let world = World::new();
        let mut registry = SubscriptionRegistry::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let id = registry
            .subscribe(transform_query(), &world, recording_callback(log))
            .unwrap();

        assert!(registry.unsubscribe(id));
        assert!(!registry.unsubscribe(id));
        assert!(!registry.unsubscribe(9999));
        assert!(!registry.is_active(id));
    }

    #[test]
    fn test_subscription_ids_are_never_reused() {
        let world = World::new();
        let mut registry = SubscriptionRegistry::new();

        let id1 = registry
            .subscribe(transform_query(), &world, Box::new(|_| {}))
            .unwrap();
        registry.unsubscribe(id1);

        let id2 = registry
            .subscribe(transform_query(), &world, Box::new(|_| {}))
            .unwrap();

        // 解除済みのIdが新しい購読に割り当て直されることはない
        assert_ne!(id1, id2);
        assert!(id2 > id1);
    }

    #[test]
    fn test_cancelled_subscription_not_swept() {
        let mut world = World::new();
        let mut registry = SubscriptionRegistry::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let id = registry
            .subscribe(transform_query(), &world, recording_callback(log.clone()))
            .unwrap();
        registry.unsubscribe(id);

        let entity = world.spawn();
        world.insert(entity, Transform::identity());
        registry.evaluate(&world);

        // 解除後は変化があっても配信されない
        assert_eq!(log.borrow().len(), 1);
    }

    // ========================================================================
    // スイープのエラー耐性
    // ========================================================================

    /// スキーマを後から縮小できるスナップショット
    ///
    /// 購読成立後に `forget_fields` すると、以後の再評価は
    /// UnknownFieldで失敗するようになる
    struct ShrinkingSnapshot {
        fields_known: Cell<bool>,
        value: Cell<f64>,
    }

    impl ShrinkingSnapshot {
        fn new() -> Self {
            Self {
                fields_known: Cell::new(true),
                value: Cell::new(1.0),
            }
        }

        fn forget_fields(&self) {
            self.fields_known.set(false);
        }
    }

    impl EntitySnapshot for ShrinkingSnapshot {
        fn entities(&self) -> Vec<EntityId> {
            vec![EntityId::new(0, 1)]
        }

        fn has_component(&self, _entity: EntityId, name: &str) -> bool {
            name == "Marker"
        }

        fn field(&self, _entity: EntityId, name: &str) -> Option<FieldValue> {
            (name == "score").then(|| FieldValue::Number(self.value.get()))
        }

        fn knows_component(&self, name: &str) -> bool {
            name == "Marker"
        }

        fn knows_field(&self, name: &str) -> bool {
            self.fields_known.get() && name == "score"
        }
    }

    #[test]
    fn test_sweep_survives_failing_subscription() {
        let snapshot = ShrinkingSnapshot::new();
        let mut registry = SubscriptionRegistry::new();

        let fragile_log = Rc::new(RefCell::new(Vec::new()));
        let fragile = registry
            .subscribe(
                QueryBuilder::new().select(["score"]).build(),
                &snapshot,
                recording_callback(fragile_log.clone()),
            )
            .unwrap();

        let sturdy_log = Rc::new(RefCell::new(Vec::new()));
        registry
            .subscribe(
                QueryBuilder::new().with(["Marker"]).build(),
                &snapshot,
                recording_callback(sturdy_log.clone()),
            )
            .unwrap();

        // スキーマが縮小し、fragile側の再評価は失敗するようになる
        snapshot.forget_fields();
        snapshot.value.set(2.0);
        registry.evaluate(&snapshot);

        // 失敗した購読: キャッシュ保持・Activeのまま・追加配信なし
        assert!(registry.is_active(fragile));
        assert_eq!(fragile_log.borrow().len(), 1);
        assert_eq!(
            fragile_log.borrow()[0].rows[0].get_field("score"),
            Some(&FieldValue::Number(1.0))
        );

        // 他の購読のスイープは継続している（変化なしなので配信は初回のみ）
        assert_eq!(sturdy_log.borrow().len(), 1);
    }
}
