use anyhow::Result;

use crate::event_model::PointerFrame;

pub mod mapper;
pub mod uinput;

pub use mapper::{CoordinateMapper, NORM_MAX, PointerEmitter};
pub use uinput::UinputPointer;

/// 宿主指针注入服务
pub trait PointerSink {
    /// 提交一个采样对应的事件组（移动，加可选的按键边沿）
    fn submit(&mut self, frame: &PointerFrame) -> Result<()>;
}

impl<S: PointerSink + ?Sized> PointerSink for &mut S {
    fn submit(&mut self, frame: &PointerFrame) -> Result<()> {
        (**self).submit(frame)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::event_model::PointerEvent;

    /// 把提交的事件按顺序记下来
    #[derive(Default)]
    pub(crate) struct RecordingSink {
        pub events: Vec<PointerEvent>,
        pub fail: bool,
    }

    impl PointerSink for RecordingSink {
        fn submit(&mut self, frame: &PointerFrame) -> Result<()> {
            if self.fail {
                anyhow::bail!("sink unavailable");
            }
            self.events.extend(frame.events());
            Ok(())
        }
    }
}
