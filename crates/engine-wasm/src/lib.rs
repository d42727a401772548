//! JSホスト境界
//!
//! WorldとクエリエンジンをまとめたEngineオブジェクトをJSへ公開する。
//! Engineはグローバルではなく明示的に構築し、ライフサイクルは呼び出し
//! 側が管理する。DescriptorはJSON文字列、Resultは構造化オブジェクト
//! としてJS側と受け渡しする。

use std::cell::RefCell;

use glam::{Quat, Vec3};
use js_sys::Function;
use wasm_bindgen::prelude::*;

use engine_core::{EntityId, Name, Transform, World};
use engine_query::{wire, QueryError, SubscriptionCallback, SubscriptionRegistry};

mod command;
mod utils;

use command::EngineCommand;
use utils::console_log;

// パニック時のスタックトレース表示
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

/// QueryErrorをJS例外値に変換
fn error_to_js(err: QueryError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Engine構造体
///
/// World・購読レジストリ・遅延コマンドキューを統合する。全フィールドを
/// RefCellで持ち、公開メソッドは`&self`で受ける: 再評価スイープ中の
/// コールバックから再入された呼び出しを、abortではなく「遅延」または
/// NotReadyエラーとして扱えるようにするため。
#[wasm_bindgen]
pub struct Engine {
    world: RefCell<World>,
    registry: RefCell<SubscriptionRegistry>,
    pending: RefCell<Vec<EngineCommand>>,
}

#[wasm_bindgen]
impl Engine {
    /// 新しいEngineを作成
    #[wasm_bindgen(constructor)]
    pub fn new() -> Engine {
        Self {
            world: RefCell::new(World::new()),
            registry: RefCell::new(SubscriptionRegistry::new()),
            pending: RefCell::new(Vec::new()),
        }
    }

    // ========================================================================
    // Entity操作
    // ========================================================================

    /// Entityを作成し、Idを返す
    ///
    /// スイープ中はIdを払い出せないためNotReadyエラーになる
    pub fn create_entity(&self, name: &str) -> Result<u32, JsValue> {
        let mut world = self
            .world
            .try_borrow_mut()
            .map_err(|_| error_to_js(QueryError::NotReady))?;

        let entity = world.spawn();
        world.insert(entity, Name::new(name));
        world.insert(entity, Transform::identity());
        Ok(entity.to_u32())
    }

    /// Entityを削除
    ///
    /// スイープ中の呼び出しは次のtickまで遅延する。戻り値は呼び出し
    /// 時点での生存状態
    pub fn delete_entity(&self, id: u32) -> bool {
        match self.world.try_borrow_mut() {
            Ok(mut world) => world.despawn(EntityId::from_u32(id)),
            Err(_) => {
                let alive = self
                    .world
                    .try_borrow()
                    .map(|world| world.is_alive(EntityId::from_u32(id)))
                    .unwrap_or(false);
                self.pending.borrow_mut().push(EngineCommand::Despawn(id));
                alive
            }
        }
    }

    /// 位置を設定
    pub fn set_position(&self, id: u32, x: f32, y: f32, z: f32) {
        match self.world.try_borrow_mut() {
            Ok(mut world) => {
                if let Some(transform) = world.get_mut::<Transform>(EntityId::from_u32(id)) {
                    transform.position = Vec3::new(x, y, z);
                }
            }
            Err(_) => self
                .pending
                .borrow_mut()
                .push(EngineCommand::SetPosition { id, x, y, z }),
        }
    }

    /// 回転を設定（クォータニオン）
    pub fn set_rotation(&self, id: u32, x: f32, y: f32, z: f32, w: f32) {
        match self.world.try_borrow_mut() {
            Ok(mut world) => {
                if let Some(transform) = world.get_mut::<Transform>(EntityId::from_u32(id)) {
                    transform.rotation = Quat::from_xyzw(x, y, z, w);
                }
            }
            Err(_) => self
                .pending
                .borrow_mut()
                .push(EngineCommand::SetRotation { id, x, y, z, w }),
        }
    }

    /// スケールを設定
    pub fn set_scale(&self, id: u32, x: f32, y: f32, z: f32) {
        match self.world.try_borrow_mut() {
            Ok(mut world) => {
                if let Some(transform) = world.get_mut::<Transform>(EntityId::from_u32(id)) {
                    transform.scale = Vec3::new(x, y, z);
                }
            }
            Err(_) => self
                .pending
                .borrow_mut()
                .push(EngineCommand::SetScale { id, x, y, z }),
        }
    }

    /// 名前を設定
    pub fn set_name(&self, id: u32, name: &str) {
        match self.world.try_borrow_mut() {
            Ok(mut world) => {
                if let Some(component) = world.get_mut::<Name>(EntityId::from_u32(id)) {
                    component.set(name);
                }
            }
            Err(_) => self.pending.borrow_mut().push(EngineCommand::SetName {
                id,
                name: name.to_string(),
            }),
        }
    }

    /// 位置を取得（x, y, zの配列）
    pub fn get_position(&self, id: u32) -> Option<Vec<f32>> {
        let world = self.world.try_borrow().ok()?;
        world
            .get::<Transform>(EntityId::from_u32(id))
            .map(|t| vec![t.position.x, t.position.y, t.position.z])
    }

    /// 回転を取得（x, y, z, wの配列）
    pub fn get_rotation(&self, id: u32) -> Option<Vec<f32>> {
        let world = self.world.try_borrow().ok()?;
        world
            .get::<Transform>(EntityId::from_u32(id))
            .map(|t| vec![t.rotation.x, t.rotation.y, t.rotation.z, t.rotation.w])
    }

    /// スケールを取得（x, y, zの配列）
    pub fn get_scale(&self, id: u32) -> Option<Vec<f32>> {
        let world = self.world.try_borrow().ok()?;
        world
            .get::<Transform>(EntityId::from_u32(id))
            .map(|t| vec![t.scale.x, t.scale.y, t.scale.z])
    }

    /// Entity名を取得
    pub fn get_name(&self, id: u32) -> Option<String> {
        let world = self.world.try_borrow().ok()?;
        world
            .get::<Name>(EntityId::from_u32(id))
            .map(|n| n.as_str().to_string())
    }

    /// Entityが生存しているか確認
    pub fn is_alive(&self, id: u32) -> bool {
        self.world
            .try_borrow()
            .map(|world| world.is_alive(EntityId::from_u32(id)))
            .unwrap_or(false)
    }

    /// 生存Entity数を取得
    pub fn entity_count(&self) -> usize {
        self.world
            .try_borrow()
            .map(|world| world.entity_count())
            .unwrap_or(0)
    }

    // ========================================================================
    // クエリ
    // ========================================================================

    /// クエリを一度だけ実行する
    ///
    /// descriptor_jsonの形式不正はValidation、未知の名前はReference系の
    /// エラー文字列として返る
    pub fn execute_query(&self, descriptor_json: &str) -> Result<JsValue, JsValue> {
        let descriptor = wire::parse_descriptor(descriptor_json).map_err(error_to_js)?;
        let world = self
            .world
            .try_borrow()
            .map_err(|_| error_to_js(QueryError::NotReady))?;

        let result = engine_query::execute(&descriptor, &*world).map_err(error_to_js)?;
        serde_wasm_bindgen::to_value(&result)
            .map_err(|err| error_to_js(QueryError::Execution(err.to_string())))
    }

    /// クエリを購読する
    ///
    /// 成立時は初回結果がその場でコールバックへ配信され、購読Idが返る。
    /// 以後はtickごとに再評価され、結果が変化したときだけ呼ばれる
    pub fn subscribe_query(
        &self,
        descriptor_json: &str,
        callback: Function,
    ) -> Result<u32, JsValue> {
        let descriptor = wire::parse_descriptor(descriptor_json).map_err(error_to_js)?;
        let world = self
            .world
            .try_borrow()
            .map_err(|_| error_to_js(QueryError::NotReady))?;
        let mut registry = self
            .registry
            .try_borrow_mut()
            .map_err(|_| error_to_js(QueryError::NotReady))?;

        let delivery: SubscriptionCallback = Box::new(move |result| {
            match serde_wasm_bindgen::to_value(result) {
                Ok(value) => {
                    let _ = callback.call1(&JsValue::NULL, &value);
                }
                Err(err) => console_log!("failed to deliver query result: {}", err),
            }
        });

        registry
            .subscribe(descriptor, &*world, delivery)
            .map_err(error_to_js)
    }

    /// 購読を解除する
    ///
    /// スイープ中の呼び出しは次のtickまで遅延する。遅延解除は冪等な
    /// ため楽観的にtrueを返す
    pub fn unsubscribe_query(&self, id: u32) -> bool {
        match self.registry.try_borrow_mut() {
            Ok(mut registry) => registry.unsubscribe(id),
            Err(_) => {
                self.pending
                    .borrow_mut()
                    .push(EngineCommand::Unsubscribe(id));
                true
            }
        }
    }

    /// フレーム更新
    ///
    /// 1. 前回のスイープ中に積まれた遅延コマンドを適用
    /// 2. 全Active購読の再評価スイープ
    ///
    /// スイープ中はWorldを共有借用で保持するため、コールバックからの
    /// 読み取りは通り、変更は遅延キューに落ちる
    pub fn tick(&self) {
        // コールバックからの再入tickは無視する
        let Ok(mut registry) = self.registry.try_borrow_mut() else {
            return;
        };

        {
            let Ok(mut world) = self.world.try_borrow_mut() else {
                return;
            };
            let commands: Vec<EngineCommand> = self.pending.borrow_mut().drain(..).collect();
            for command in commands {
                command.apply(&mut world, &mut registry);
            }
        }

        let Ok(world) = self.world.try_borrow() else {
            return;
        };
        registry.evaluate(&*world);
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
