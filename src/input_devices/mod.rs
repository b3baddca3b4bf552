use std::fmt;

use thiserror::Error;

pub mod hotplug;
pub mod usb;

/// 一帧原始报告的固定长度
pub const REPORT_LEN: usize = 10;

/// 厂商/产品 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceIdentity {
    pub vendor_id: u16,
    pub product_id: u16,
}

impl DeviceIdentity {
    pub const fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
        }
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vendor_id, self.product_id)
    }
}

/// 一次读取得到的原始报告，读不满时剩余字节为 0
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct RawReport(pub [u8; REPORT_LEN]);

impl RawReport {
    pub fn from_slice(buf: &[u8]) -> Self {
        let mut report = [0u8; REPORT_LEN];
        let len = buf.len().min(REPORT_LEN);
        report[..len].copy_from_slice(&buf[..len]);
        Self(report)
    }

    pub fn bytes(&self) -> &[u8; REPORT_LEN] {
        &self.0
    }
}

impl fmt::Debug for RawReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x?}", self.0)
    }
}

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("usb: {0}")]
    Usb(#[from] rusb::Error),
    /// 读请求尚未完成，不算失败
    #[error("read still pending")]
    Pending,
    #[error("device is gone")]
    Disconnected,
}

/// 一个已打开的设备通道
///
/// 同一时刻整个进程只允许存在一个处于连接状态的 `TabletDevice`，所有权归 `Connection`
pub trait TabletDevice: Send + Sync + 'static {
    fn identity(&self) -> Result<DeviceIdentity, DeviceError>;

    /// 发送一个短的 feature 报告
    fn send_feature(&self, report: &[u8]) -> Result<(), DeviceError>;

    /// 阻塞读取一帧报告
    fn read_report(&self) -> Result<RawReport, DeviceError>;
}

/// 设备枚举与打开
pub trait DeviceSource: Send + Sync + 'static {
    /// 不透明的设备路径/标识
    type Token: Send + 'static;
    type Device: TabletDevice;

    /// 列出当前存在的候选设备
    fn enumerate(&self) -> Result<Vec<Self::Token>, DeviceError>;

    /// 热插拔通知送来的设备是否属于目标接口类
    fn is_candidate(&self, _token: &Self::Token) -> bool {
        true
    }

    fn open(&self, token: &Self::Token) -> Result<Self::Device, DeviceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_read_is_zero_padded() {
        let report = RawReport::from_slice(&[0x02, 0x01, 0x34]);
        assert_eq!(report.bytes(), &[0x02, 0x01, 0x34, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn long_read_is_truncated() {
        let report = RawReport::from_slice(&[0xffu8; 64]);
        assert_eq!(report.bytes(), &[0xffu8; REPORT_LEN]);
    }

    #[test]
    fn identity_displays_as_hex_pair() {
        assert_eq!(DeviceIdentity::new(0x056a, 0x037b).to_string(), "056a:037b");
    }
}
