pub mod event;

pub use event::{ButtonEdge, PenSample, PointerEvent, PointerFrame};
