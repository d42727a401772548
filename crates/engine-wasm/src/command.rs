//! 遅延コマンド
//!
//! 再評価スイープの最中に要求されたワールド変更・購読解除は即時適用
//! できない（進行中の候補集合イテレーションを壊してしまう）。代わりに
//! コマンドとして積んでおき、次のtick冒頭・スイープ開始前に適用する。

use engine_core::{EntityId, Name, Transform, World};
use engine_query::SubscriptionRegistry;
use glam::{Quat, Vec3};

/// 次のtickまで持ち越されるエンジン操作
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    Despawn(u32),
    SetPosition { id: u32, x: f32, y: f32, z: f32 },
    SetRotation { id: u32, x: f32, y: f32, z: f32, w: f32 },
    SetScale { id: u32, x: f32, y: f32, z: f32 },
    SetName { id: u32, name: String },
    Unsubscribe(u32),
}

impl EngineCommand {
    /// コマンドを適用する
    ///
    /// 対象Entityが既に削除されている場合や購読が解除済みの場合は
    /// 黙って何もしない（遅延適用は本質的に競合しうるため）
    pub fn apply(self, world: &mut World, registry: &mut SubscriptionRegistry) {
        match self {
            EngineCommand::Despawn(id) => {
                world.despawn(EntityId::from_u32(id));
            }
            EngineCommand::SetPosition { id, x, y, z } => {
                if let Some(transform) = world.get_mut::<Transform>(EntityId::from_u32(id)) {
                    transform.position = Vec3::new(x, y, z);
                }
            }
            EngineCommand::SetRotation { id, x, y, z, w } => {
                if let Some(transform) = world.get_mut::<Transform>(EntityId::from_u32(id)) {
                    transform.rotation = Quat::from_xyzw(x, y, z, w);
                }
            }
            EngineCommand::SetScale { id, x, y, z } => {
                if let Some(transform) = world.get_mut::<Transform>(EntityId::from_u32(id)) {
                    transform.scale = Vec3::new(x, y, z);
                }
            }
            EngineCommand::SetName { id, name } => {
                if let Some(component) = world.get_mut::<Name>(EntityId::from_u32(id)) {
                    component.set(name);
                }
            }
            EngineCommand::Unsubscribe(id) => {
                registry.unsubscribe(id);
            }
        }
    }
}
