use thiserror::Error;

use super::{MODE_SWITCH_REPORT, TABLET_IDENTITY};
use crate::input_devices::{DeviceError, DeviceIdentity, TabletDevice};

/// 候选设备被拒绝的原因；由调用方负责释放句柄
#[derive(Debug, Error)]
pub enum Rejected {
    #[error("cannot read device identity")]
    Unreadable(#[source] DeviceError),
    #[error("{0} is not the tablet")]
    Identity(DeviceIdentity),
    #[error("mode switch refused")]
    ModeSwitch(#[source] DeviceError),
}

/// 校验一个已打开的句柄，并把设备切换到绝对坐标模式
///
/// 只检查和配置传进来的这一个句柄，不触碰任何进程状态
pub fn accept<D: TabletDevice + ?Sized>(device: &D) -> Result<(), Rejected> {
    let identity = device.identity().map_err(Rejected::Unreadable)?;
    if identity != TABLET_IDENTITY {
        return Err(Rejected::Identity(identity));
    }
    device
        .send_feature(&MODE_SWITCH_REPORT)
        .map_err(Rejected::ModeSwitch)
}
