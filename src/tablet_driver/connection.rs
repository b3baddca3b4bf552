use std::sync::Arc;

use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

/// 唯一的设备句柄槽位
///
/// 句柄放在 `watch` 通道里，安装/清除与“已连接”信号是同一次原子操作；
/// 热插拔 watcher 写入，读循环在读失败时清除
pub struct Connection<D> {
    slot: watch::Sender<Option<Arc<D>>>,
}

impl<D> Default for Connection<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> Connection<D> {
    pub fn new() -> Self {
        Self {
            slot: watch::Sender::new(None),
        }
    }

    pub fn current_handle(&self) -> Option<Arc<D>> {
        self.slot.borrow().clone()
    }

    pub fn state(&self) -> ConnectionState {
        match *self.slot.borrow() {
            Some(_) => ConnectionState::Connected,
            None => ConnectionState::Disconnected,
        }
    }

    /// 安装一个新的已连接句柄
    ///
    /// 已经有句柄时不覆盖，原样把新句柄还给调用方，由调用方关闭
    pub fn publish(&self, handle: D) -> Result<(), D> {
        let mut handle = Some(handle);
        self.slot.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = handle.take().map(Arc::new);
            true
        });
        match handle {
            None => Ok(()),
            Some(rejected) => Err(rejected),
        }
    }

    /// 转为断开状态并释放句柄
    ///
    /// 读循环可能还持有一份 `Arc`，最后一份被丢弃时设备才真正关闭
    pub fn demote(&self) {
        self.slot.send_replace(None);
    }

    /// 阻塞直到有句柄被安装，期间不占用 CPU
    pub async fn wait_connected(&self) -> Arc<D> {
        let mut rx = self.slot.subscribe();
        loop {
            let current = rx.borrow_and_update().clone();
            if let Some(handle) = current {
                return handle;
            }
            // `self` 持有发送端，`changed` 不会因为通道关闭而失败
            let _ = rx.changed().await;
        }
    }
}
