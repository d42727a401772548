/// 全コンポーネントが実装すべきマーカートレイト
/// - `'static`: コンポーネントは参照を持たない
/// - `Send + Sync`: 将来のマルチスレッド対応
pub trait Component: 'static + Send + Sync {}
