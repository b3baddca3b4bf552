/// 一帧被接受的笔报告解出来的语义采样
///
/// 被丢弃的报告不会产生 `PenSample`，`valid == false` 的采样也不会产生任何指针事件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PenSample {
    pub valid: bool,
    pub in_contact: bool,
    pub raw_x: u16,
    pub raw_y: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEdge {
    Down,
    Up,
}

/// 单个指针事件，坐标位于宿主的归一化绝对坐标空间 `0..=NORM_MAX`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Move { x: u32, y: u32 },
    ButtonDown,
    ButtonUp,
}

impl From<ButtonEdge> for PointerEvent {
    fn from(edge: ButtonEdge) -> Self {
        match edge {
            ButtonEdge::Down => Self::ButtonDown,
            ButtonEdge::Up => Self::ButtonUp,
        }
    }
}

/// 一个采样对应的一组事件：总是先移动，再跟一个可选的按键边沿
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerFrame {
    pub x: u32,
    pub y: u32,
    pub edge: Option<ButtonEdge>,
}

impl PointerFrame {
    pub fn events(&self) -> impl Iterator<Item = PointerEvent> {
        std::iter::once(PointerEvent::Move {
            x: self.x,
            y: self.y,
        })
        .chain(self.edge.map(PointerEvent::from))
    }
}
