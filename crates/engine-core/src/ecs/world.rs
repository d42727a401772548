use std::any::TypeId;
use std::collections::HashMap;

use super::component::Component;
use super::entity::EntityId;
use super::storage::ComponentStorage;

/// Entityスロットの生存情報
struct EntitySlot {
    /// 現在の世代番号
    generation: u32,
    /// 生成順の通し番号（スロット再利用後も単調増加）
    sequence: u64,
    /// 生存フラグ
    alive: bool,
}

/// 型消去されたストレージのトレイト
trait AnyStorage: Send + Sync {
    fn as_any(&self) -> &dyn std::any::Any;
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
    fn remove(&mut self, entity: EntityId);
}

impl<T: Component> AnyStorage for ComponentStorage<T> {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
    fn remove(&mut self, entity: EntityId) {
        ComponentStorage::remove(self, entity);
    }
}

/// ECSのメインコンテナ
/// 全てのEntity/Componentを管理する
///
/// 生存Entityの列挙順は生成順で安定している。スロットが再利用されても
/// sequence番号は巻き戻らないため、クエリ側から見た自然順序は
/// Worldが変化しない限り何度列挙しても同一になる。
pub struct World {
    /// Entityスロット配列
    slots: Vec<EntitySlot>,
    /// 再利用可能なスロットインデックス
    free_slots: Vec<u32>,
    /// 次に払い出す生成通し番号
    next_sequence: u64,
    /// 型ごとのコンポーネントストレージ
    storages: HashMap<TypeId, Box<dyn AnyStorage>>,
}

impl World {
    /// 新しいWorldを作成
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_slots: Vec::new(),
            next_sequence: 0,
            storages: HashMap::new(),
        }
    }

    /// 新規Entityを生成
    pub fn spawn(&mut self) -> EntityId {
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        if let Some(index) = self.free_slots.pop() {
            // 再利用: 世代番号をインクリメント
            let slot = &mut self.slots[index as usize];
            slot.generation += 1;
            slot.sequence = sequence;
            slot.alive = true;
            EntityId::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(EntitySlot {
                generation: 1,
                sequence,
                alive: true,
            });
            EntityId::new(index, 1)
        }
    }

    /// Entityを削除
    /// 成功時true、既に削除済みまたは無効なEntityの場合false
    pub fn despawn(&mut self, entity: EntityId) -> bool {
        let index = entity.index() as usize;

        let Some(slot) = self.slots.get_mut(index) else {
            return false;
        };
        if !slot.alive || slot.generation != entity.generation() {
            return false;
        }

        slot.alive = false;
        self.free_slots.push(entity.index());

        // 全ストレージからコンポーネントを削除
        for storage in self.storages.values_mut() {
            storage.remove(entity);
        }

        true
    }

    /// Entityが生存しているか確認
    pub fn is_alive(&self, entity: EntityId) -> bool {
        let index = entity.index() as usize;
        self.slots
            .get(index)
            .is_some_and(|slot| slot.alive && slot.generation == entity.generation())
    }

    /// コンポーネントを追加
    pub fn insert<T: Component>(&mut self, entity: EntityId, component: T) {
        if !self.is_alive(entity) {
            return;
        }

        let storage = self.get_or_create_storage::<T>();
        storage.insert(entity, component);
    }

    /// コンポーネントを取得（不変参照）
    pub fn get<T: Component>(&self, entity: EntityId) -> Option<&T> {
        if !self.is_alive(entity) {
            return None;
        }

        self.get_storage::<T>()?.get(entity)
    }

    /// コンポーネントを取得（可変参照）
    pub fn get_mut<T: Component>(&mut self, entity: EntityId) -> Option<&mut T> {
        if !self.is_alive(entity) {
            return None;
        }

        self.get_storage_mut::<T>()?.get_mut(entity)
    }

    /// コンポーネントを削除
    pub fn remove<T: Component>(&mut self, entity: EntityId) -> Option<T> {
        if !self.is_alive(entity) {
            return None;
        }

        self.get_storage_mut::<T>()?.remove(entity)
    }

    /// Entityが指定型のコンポーネントを持つか
    pub fn has<T: Component>(&self, entity: EntityId) -> bool {
        self.is_alive(entity)
            && self
                .get_storage::<T>()
                .is_some_and(|storage| storage.contains(entity))
    }

    /// 全生存Entityを生成順にイテレート
    pub fn iter_entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        let mut alive: Vec<(u64, EntityId)> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.alive)
            .map(|(index, slot)| {
                (slot.sequence, EntityId::new(index as u32, slot.generation))
            })
            .collect();
        alive.sort_unstable_by_key(|(sequence, _)| *sequence);
        alive.into_iter().map(|(_, entity)| entity)
    }

    /// 生存Entity数を取得
    pub fn entity_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.alive).count()
    }

    /// 型に対応するストレージを取得または作成
    fn get_or_create_storage<T: Component>(&mut self) -> &mut ComponentStorage<T> {
        let type_id = TypeId::of::<T>();

        self.storages
            .entry(type_id)
            .or_insert_with(|| Box::new(ComponentStorage::<T>::new()))
            .as_any_mut()
            .downcast_mut::<ComponentStorage<T>>()
            .expect("type mismatch in storage")
    }

    /// 型に対応するストレージを取得（不変）
    fn get_storage<T: Component>(&self) -> Option<&ComponentStorage<T>> {
        let type_id = TypeId::of::<T>();
        self.storages
            .get(&type_id)?
            .as_any()
            .downcast_ref::<ComponentStorage<T>>()
    }

    /// 型に対応するストレージを取得（可変）
    fn get_storage_mut<T: Component>(&mut self) -> Option<&mut ComponentStorage<T>> {
        let type_id = TypeId::of::<T>();
        self.storages
            .get_mut(&type_id)?
            .as_any_mut()
            .downcast_mut::<ComponentStorage<T>>()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
