use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rusb::{Context, Device, DeviceHandle, Direction, Recipient, RequestType, UsbContext};
use tracing::{debug, warn};

use super::{DeviceError, DeviceIdentity, DeviceSource, REPORT_LEN, RawReport, TabletDevice};
use crate::config::UsbConfig;

const HID_CLASS: u8 = 0x03;
const HID_SET_REPORT: u8 = 0x09;
const HID_REPORT_TYPE_FEATURE: u16 = 0x03;
const CONTROL_TIMEOUT: Duration = Duration::from_millis(1000);
/// libusb 里 0 表示不限时
const READ_TIMEOUT: Duration = Duration::ZERO;

/// 基于 libusb 的枚举和打开
pub struct UsbSource {
    context: Context,
    interface: u8,
    endpoint: u8,
}

impl UsbSource {
    pub fn new(context: Context, conf: &UsbConfig) -> Self {
        Self {
            context,
            interface: conf.interface,
            endpoint: conf.endpoint,
        }
    }
}

impl DeviceSource for UsbSource {
    type Token = Device<Context>;
    type Device = UsbTablet;

    fn enumerate(&self) -> Result<Vec<Self::Token>, DeviceError> {
        Ok(self
            .context
            .devices()?
            .iter()
            .filter(has_hid_interface)
            .collect())
    }

    fn is_candidate(&self, token: &Self::Token) -> bool {
        has_hid_interface(token)
    }

    fn open(&self, token: &Self::Token) -> Result<Self::Device, DeviceError> {
        let handle = token.open()?;
        // 部分平台不支持，失败时在 claim 之前手动 detach
        if let Err(e) = handle.set_auto_detach_kernel_driver(true) {
            debug!("auto detach unavailable: {e}");
        }
        Ok(UsbTablet {
            handle,
            interface: self.interface,
            endpoint: self.endpoint,
            claimed: AtomicBool::new(false),
        })
    }
}

fn has_hid_interface<T: UsbContext>(device: &Device<T>) -> bool {
    let Ok(config) = device.active_config_descriptor() else {
        return false;
    };
    config
        .interfaces()
        .flat_map(|interface| interface.descriptors().collect::<Vec<_>>())
        .any(|descriptor| descriptor.class_code() == HID_CLASS)
}

/// 打开的 USB 数位板，drop 时释放接口并关闭
pub struct UsbTablet {
    handle: DeviceHandle<Context>,
    interface: u8,
    endpoint: u8,
    claimed: AtomicBool,
}

impl UsbTablet {
    fn claim(&self) -> Result<(), DeviceError> {
        if self.claimed.load(Ordering::Acquire) {
            return Ok(());
        }
        if matches!(self.handle.kernel_driver_active(self.interface), Ok(true)) {
            self.handle.detach_kernel_driver(self.interface)?;
        }
        self.handle.claim_interface(self.interface)?;
        self.claimed.store(true, Ordering::Release);
        Ok(())
    }
}

impl TabletDevice for UsbTablet {
    fn identity(&self) -> Result<DeviceIdentity, DeviceError> {
        let descriptor = self.handle.device().device_descriptor()?;
        Ok(DeviceIdentity::new(
            descriptor.vendor_id(),
            descriptor.product_id(),
        ))
    }

    /// HID `SET_REPORT(Feature)`；报告的第一个字节是 report id
    ///
    /// 读取前必须先切换模式，所以接口在这里被独占
    fn send_feature(&self, report: &[u8]) -> Result<(), DeviceError> {
        self.claim()?;
        let report_id = report.first().copied().unwrap_or_default() as u16;
        let written = self.handle.write_control(
            rusb::request_type(Direction::Out, RequestType::Class, Recipient::Interface),
            HID_SET_REPORT,
            (HID_REPORT_TYPE_FEATURE << 8) | report_id,
            self.interface as u16,
            report,
            CONTROL_TIMEOUT,
        )?;
        if written != report.len() {
            return Err(DeviceError::Usb(rusb::Error::Io));
        }
        Ok(())
    }

    fn read_report(&self) -> Result<RawReport, DeviceError> {
        let mut buf = [0u8; REPORT_LEN];
        match self
            .handle
            .read_interrupt(self.endpoint, &mut buf, READ_TIMEOUT)
        {
            Ok(len) => Ok(RawReport::from_slice(&buf[..len])),
            Err(rusb::Error::Timeout | rusb::Error::Interrupted) => Err(DeviceError::Pending),
            Err(rusb::Error::NoDevice) => Err(DeviceError::Disconnected),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for UsbTablet {
    fn drop(&mut self) {
        if self.claimed.load(Ordering::Acquire) {
            if let Err(e) = self.handle.release_interface(self.interface) {
                // 设备被拔掉后这里必然失败
                debug!("release_interface({}) failed: {e}", self.interface);
            }
        }
    }
}

/// `list` 子命令输出的一行
#[derive(Debug, Clone)]
pub struct Candidate {
    pub bus: u8,
    pub address: u8,
    pub identity: Option<DeviceIdentity>,
}

pub fn list_candidates(source: &UsbSource) -> Result<Vec<Candidate>, DeviceError> {
    let devices = source.enumerate()?;
    Ok(devices
        .iter()
        .map(|device| {
            let identity = match device.device_descriptor() {
                Ok(d) => Some(DeviceIdentity::new(d.vendor_id(), d.product_id())),
                Err(e) => {
                    warn!(
                        "bus {} device {}: no descriptor: {e}",
                        device.bus_number(),
                        device.address()
                    );
                    None
                }
            };
            Candidate {
                bus: device.bus_number(),
                address: device.address(),
                identity,
            }
        })
        .collect())
}
