//! 网络客户端插槽：显式的 setup / teardown 作用域
//!
//! 每个网络能力（Unsplash、DeepSeek）对应一个 ClientSlot，通过 clone 注入到工具与 Agent 中。
//! `setup` 安装客户端并返回 ClientGuard，guard 被 drop 时移除客户端（连接池随最后一个 Arc 一起释放）；
//! 未安装时 `get` 返回 ClientNotInitialized，不发出任何网络请求。

use std::sync::{Arc, RwLock};

use crate::core::PageGenError;

/// 命名的客户端插槽，可跨任务共享
pub struct ClientSlot<C: ?Sized> {
    name: &'static str,
    inner: Arc<RwLock<Option<Arc<C>>>>,
}

impl<C: ?Sized> Clone for ClientSlot<C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: ?Sized> ClientSlot<C> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            inner: Arc::new(RwLock::new(None)),
        }
    }

    /// 安装客户端；返回的 guard 存活期间 `get` 可用。重复 setup 会替换旧客户端
    pub fn setup(&self, client: Arc<C>) -> ClientGuard<C> {
        let mut slot = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(client);
        tracing::debug!(client = self.name, "client installed");
        ClientGuard { slot: self.clone() }
    }

    pub fn get(&self) -> Result<Arc<C>, PageGenError> {
        let slot = self.inner.read().unwrap_or_else(|e| e.into_inner());
        (*slot)
            .clone()
            .ok_or(PageGenError::ClientNotInitialized(self.name))
    }

    pub fn is_initialized(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    fn teardown(&self) {
        let mut slot = self.inner.write().unwrap_or_else(|e| e.into_inner());
        if slot.take().is_some() {
            tracing::debug!(client = self.name, "client released");
        }
    }
}

/// setup 作用域：drop 时（包括错误提前返回、panic 展开）移除客户端
#[must_use = "dropping the guard immediately releases the client"]
pub struct ClientGuard<C: ?Sized> {
    slot: ClientSlot<C>,
}

impl<C: ?Sized> Drop for ClientGuard<C> {
    fn drop(&mut self) {
        self.slot.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_before_setup() {
        let slot: ClientSlot<String> = ClientSlot::new("unsplash");
        let err = slot.get().unwrap_err();
        assert!(matches!(err, PageGenError::ClientNotInitialized("unsplash")));
        assert!(!slot.is_initialized());
    }

    #[test]
    fn test_setup_returns_same_instance() {
        let slot: ClientSlot<String> = ClientSlot::new("deepseek");
        let _guard = slot.setup(Arc::new("client".to_string()));
        let a = slot.get().unwrap();
        let b = slot.clone().get().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_guard_drop_releases_client() {
        let slot: ClientSlot<String> = ClientSlot::new("unsplash");
        {
            let _guard = slot.setup(Arc::new("client".to_string()));
            assert!(slot.is_initialized());
        }
        assert!(!slot.is_initialized());
        assert!(slot.get().is_err());
    }

    #[test]
    fn test_slot_holds_trait_objects() {
        trait Named: Send + Sync {
            fn name(&self) -> &str;
        }
        struct Fixed;
        impl Named for Fixed {
            fn name(&self) -> &str {
                "fixed"
            }
        }

        let slot: ClientSlot<dyn Named> = ClientSlot::new("named");
        let _guard = slot.setup(Arc::new(Fixed));
        assert_eq!(slot.get().unwrap().name(), "fixed");
    }
}
