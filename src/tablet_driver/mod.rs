use crate::input_devices::DeviceIdentity;

pub mod connection;
pub mod decoder;
pub mod matcher;
pub mod reader;
pub mod shutdown;
pub mod watcher;

pub use connection::{Connection, ConnectionState};
pub use watcher::HotplugWatcher;

/// Wacom CTL-672 (One by Wacom M)
pub const TABLET_IDENTITY: DeviceIdentity = DeviceIdentity::new(0x056a, 0x037b);

/// 切换到绝对坐标上报模式的 feature 报告
pub const MODE_SWITCH_REPORT: [u8; 2] = [0x02, 0x02];

/// 传感器逻辑尺寸
pub const DEVICE_X_EXTENT: u16 = 21600;
pub const DEVICE_Y_EXTENT: u16 = 13500;
