pub mod ecs;
pub mod components;

// Re-exports
pub use ecs::{Component, ComponentStorage, EntityId, World};
pub use components::{Name, Transform};
