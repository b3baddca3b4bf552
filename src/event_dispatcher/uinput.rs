use anyhow::{Context, Result};
use evdev_rs::enums::{EV_ABS, EV_KEY, EV_SYN, EventCode, EventType, InputProp};
use evdev_rs::{AbsInfo, DeviceWrapper, EnableCodeData, InputEvent, TimeVal, UInputDevice, UninitDevice};

use super::{NORM_MAX, PointerSink};
use crate::event_model::{ButtonEdge, PointerFrame};
use crate::tablet_driver::TABLET_IDENTITY;

const BUS_USB: u16 = 0x03;

/// 基于 uinput 的绝对坐标指针
pub struct UinputPointer {
    device: UInputDevice,
}

impl UinputPointer {
    pub fn create(name: &str) -> Result<Self> {
        let ud = UninitDevice::new().context("UninitDevice::new")?;
        ud.set_name(name);
        ud.set_bustype(BUS_USB);
        ud.set_vendor_id(TABLET_IDENTITY.vendor_id);
        ud.set_product_id(TABLET_IDENTITY.product_id);

        for axis in [EV_ABS::ABS_X, EV_ABS::ABS_Y] {
            ud.enable_event_code(
                &EventCode::EV_ABS(axis),
                Some(EnableCodeData::AbsInfo(AbsInfo {
                    value: 0,
                    minimum: 0,
                    maximum: NORM_MAX as i32,
                    fuzz: 0,
                    flat: 0,
                    resolution: 0,
                })),
            )
            .with_context(|| format!("UninitDevice::enable_event_code({axis:?})"))?;
        }
        ud.enable_event_code(&EventCode::EV_KEY(EV_KEY::BTN_LEFT), None)
            .context("UninitDevice::enable_event_code(BTN_LEFT)")?;
        ud.enable_event_type(&EventType::EV_SYN)
            .context("UninitDevice::enable_event_type(EV_SYN)")?;
        ud.enable_property(&InputProp::INPUT_PROP_POINTER)
            .context("UninitDevice::enable_property(INPUT_PROP_POINTER)")?;

        let device =
            UInputDevice::create_from_device(&ud).context("UInputDevice::create_from_device")?;
        Ok(Self { device })
    }

    fn write(&self, code: EventCode, value: i32) -> Result<()> {
        let dummy_timeval = TimeVal::new(0, 0);
        self.device
            .write_event(&InputEvent::new(&dummy_timeval, &code, value))
            .context("UInputDevice::write_event")
    }
}

impl PointerSink for UinputPointer {
    fn submit(&mut self, frame: &PointerFrame) -> Result<()> {
        self.write(EventCode::EV_ABS(EV_ABS::ABS_X), frame.x as i32)?;
        self.write(EventCode::EV_ABS(EV_ABS::ABS_Y), frame.y as i32)?;
        if let Some(edge) = frame.edge {
            let pressed = match edge {
                ButtonEdge::Down => 1,
                ButtonEdge::Up => 0,
            };
            self.write(EventCode::EV_KEY(EV_KEY::BTN_LEFT), pressed)?;
        }
        self.write(EventCode::EV_SYN(EV_SYN::SYN_REPORT), 0)
    }
}
