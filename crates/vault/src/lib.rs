//! Yandex Disk adapter for the `FileVault` port.

pub mod api;
pub mod vault;

pub use api::{VaultError, YandexDiskApi};
