use crate::event_model::{ButtonEdge, PenSample, PointerFrame};
use crate::tablet_driver::{DEVICE_X_EXTENT, DEVICE_Y_EXTENT};

/// 宿主归一化绝对坐标的上限
pub const NORM_MAX: u32 = 65535;

/// 传感器坐标到 `0..=NORM_MAX` 的线性换算，超出尺寸的值截到 `NORM_MAX`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinateMapper {
    x_extent: u16,
    y_extent: u16,
}

impl Default for CoordinateMapper {
    fn default() -> Self {
        Self::new(DEVICE_X_EXTENT, DEVICE_Y_EXTENT)
    }
}

impl CoordinateMapper {
    pub const fn new(x_extent: u16, y_extent: u16) -> Self {
        Self { x_extent, y_extent }
    }

    pub fn map(&self, raw_x: u16, raw_y: u16) -> (u32, u32) {
        (scale(raw_x, self.x_extent), scale(raw_y, self.y_extent))
    }
}

fn scale(raw: u16, extent: u16) -> u32 {
    if extent == 0 {
        return 0;
    }
    let raw = raw.min(extent) as u64;
    (raw * NORM_MAX as u64 / extent as u64) as u32
}

/// 一次连接会话内的指针发射器
///
/// `contact_down` 记录上一个被接受的采样里笔尖是否按下；每次重新连接都新建一个发射器，
/// 所以它总是从“未按下”开始
#[derive(Debug, Default)]
pub struct PointerEmitter {
    mapper: CoordinateMapper,
    contact_down: bool,
}

impl PointerEmitter {
    pub fn new(mapper: CoordinateMapper) -> Self {
        Self {
            mapper,
            contact_down: false,
        }
    }

    pub fn contact_down(&self) -> bool {
        self.contact_down
    }

    /// 每个有效采样都产生一次移动；只有笔尖状态翻转时才附带按键边沿
    pub fn process(&mut self, sample: &PenSample) -> Option<PointerFrame> {
        if !sample.valid {
            return None;
        }
        let (x, y) = self.mapper.map(sample.raw_x, sample.raw_y);
        let edge = match (self.contact_down, sample.in_contact) {
            (false, true) => Some(ButtonEdge::Down),
            (true, false) => Some(ButtonEdge::Up),
            _ => None,
        };
        self.contact_down = sample.in_contact;
        Some(PointerFrame { x, y, edge })
    }
}
