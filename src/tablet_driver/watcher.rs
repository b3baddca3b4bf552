use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, trace, warn};

use super::connection::{Connection, ConnectionState};
use super::matcher;
use crate::input_devices::{DeviceError, DeviceSource};

/// 对每个到达的设备执行匹配，成功后把句柄交给 `Connection`
///
/// 与读循环运行在不同的上下文里，二者只通过 `Connection` 交互
pub struct HotplugWatcher<S: DeviceSource> {
    source: Arc<S>,
    connection: Arc<Connection<S::Device>>,
}

impl<S: DeviceSource> HotplugWatcher<S> {
    pub fn new(source: Arc<S>, connection: Arc<Connection<S::Device>>) -> Self {
        Self { source, connection }
    }

    /// 处理一次设备到达，返回是否建立了新连接
    ///
    /// 已连接时直接忽略，不会打开第二个句柄
    pub fn handle_arrival(&self, token: &S::Token) -> bool {
        if self.connection.state() == ConnectionState::Connected {
            trace!("arrival ignored, already connected");
            return false;
        }
        if !self.source.is_candidate(token) {
            return false;
        }
        let device = match self.source.open(token) {
            Ok(device) => device,
            Err(e) => {
                debug!("cannot open candidate: {e}");
                return false;
            }
        };
        if let Err(e) = matcher::accept(&device) {
            debug!("candidate rejected: {e}");
            return false;
        }
        match self.connection.publish(device) {
            Ok(()) => {
                info!("Connected Wacom CTL-672 tablet.");
                true
            }
            Err(_superseded) => {
                debug!("another handle was published first, closing this one");
                false
            }
        }
    }

    /// 启动时枚举现有设备，接受第一个匹配的
    pub fn scan_present(&self) -> Result<bool, DeviceError> {
        for token in self.source.enumerate()? {
            if self.handle_arrival(&token) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// 消费热插拔通知，直到发送端全部关闭
    pub async fn run(self: Arc<Self>, mut arrivals: UnboundedReceiver<S::Token>) {
        while let Some(token) = arrivals.recv().await {
            let watcher = self.clone();
            // 打开设备和发送 feature 报告都是阻塞 I/O
            let result =
                tokio::task::spawn_blocking(move || watcher.handle_arrival(&token)).await;
            if let Err(e) = result {
                warn!("arrival handling panicked: {e}");
            }
        }
        debug!("arrival channel closed");
    }
}
