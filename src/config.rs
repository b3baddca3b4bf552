use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// 驱动配置，所有字段都有默认值，不提供坐标校准
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub usb: UsbConfig,
    pub pointer: PointerConfig,
    pub hotplug: HotplugConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct UsbConfig {
    /// 笔报告所在的接口号
    pub interface: u8,
    /// 中断 IN 端点
    pub endpoint: u8,
}

impl Default for UsbConfig {
    fn default() -> Self {
        Self {
            interface: 0,
            endpoint: 0x81,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct PointerConfig {
    /// uinput 虚拟设备名
    pub name: String,
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self {
            name: "Tiny Tablet Driver (CTL-672)".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct HotplugConfig {
    /// libusb 不支持热插拔时轮询枚举的间隔
    pub poll_interval_ms: u64,
}

impl Default for HotplugConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2000,
        }
    }
}

impl HotplugConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("配置文件格式错误")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件{}", path.display()))?;
        Self::from_toml(&text)
    }

    /// 未指定路径时使用默认配置
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
