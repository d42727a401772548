//! クエリビルダー
//!
//! fluent APIでQueryDescriptorを構築する。各メソッドはビルダー自身を
//! 返し、`build()` が完成したDescriptorのコピーを返す。

use crate::descriptor::{FilterExpr, OrderBy, QueryDescriptor};

/// QueryDescriptorのfluentビルダー
///
/// - `select` / `order_by` は呼ぶたびに前回の指定を置き換える
/// - `with` / `without` / `filter` は累積する（重複指定は無害）
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    descriptor: QueryDescriptor,
}

impl QueryBuilder {
    /// 空のビルダーを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 取得フィールドを設定（前回のselectを置き換える）
    pub fn select(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.descriptor.select = fields.into_iter().map(Into::into).collect();
        self
    }

    /// 必須コンポーネントを追加
    pub fn with(mut self, components: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.descriptor
            .with_components
            .extend(components.into_iter().map(Into::into));
        self
    }

    /// 除外コンポーネントを追加
    pub fn without(mut self, components: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.descriptor
            .without_components
            .extend(components.into_iter().map(Into::into));
        self
    }

    /// 必須コンポーネントを1つ追加
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.descriptor.with_components.push(component.into());
        self
    }

    /// 除外コンポーネントを1つ追加
    pub fn without_component(mut self, component: impl Into<String>) -> Self {
        self.descriptor.without_components.push(component.into());
        self
    }

    /// フィルター条件を追加（AND結合）
    pub fn filter(mut self, expr: FilterExpr) -> Self {
        self.descriptor.filters.push(expr);
        self
    }

    /// ソート条件を設定（前回のorder_byを置き換える）
    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.descriptor.order_by = Some(order);
        self
    }

    /// 取得上限を設定
    pub fn limit(mut self, n: usize) -> Self {
        self.descriptor.limit = Some(n);
        self
    }

    /// 読み飛ばし件数を設定
    pub fn offset(mut self, n: usize) -> Self {
        self.descriptor.offset = n;
        self
    }

    /// ページ指定（page_indexは0始まり）
    /// `offset = page_index * per_page`, `limit = per_page` に展開される
    pub fn page(mut self, page_index: usize, per_page: usize) -> Self {
        self.descriptor.offset = page_index * per_page;
        self.descriptor.limit = Some(per_page);
        self
    }

    /// Descriptorを確定する
    pub fn build(&self) -> QueryDescriptor {
        self.descriptor.clone()
    }
}

impl QueryDescriptor {
    /// 新しいビルダーを作成
    pub fn builder() -> QueryBuilder {
        QueryBuilder::new()
    }
}
