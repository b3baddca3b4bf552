use num_enum::TryFromPrimitive;

use crate::event_model::PenSample;
use crate::input_devices::RawReport;

#[derive(Debug, Clone, Copy, TryFromPrimitive)]
#[repr(u8)]
enum ReportId {
    Pen = 0x02,
}

/// 状态字节里表示“没有笔可报告”的值
#[derive(Debug, Clone, Copy, TryFromPrimitive)]
#[repr(u8)]
enum IdleState {
    OutOfProximity = 0x00,
    Reserved = 0x80,
}

const TIP_SWITCH: u8 = 0x01;

/// 解码一帧报告；返回 `None` 表示整帧丢弃，不产生任何下游事件
///
/// 压感、倾斜等字段不解析
pub fn decode(report: &RawReport) -> Option<PenSample> {
    let buf = report.bytes();
    ReportId::try_from(buf[0]).ok()?;
    let state = buf[1];
    if IdleState::try_from(state).is_ok() {
        return None;
    }
    Some(PenSample {
        valid: true,
        in_contact: state & TIP_SWITCH != 0,
        raw_x: u16::from_le_bytes([buf[2], buf[3]]),
        raw_y: u16::from_le_bytes([buf[4], buf[5]]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(bytes: &[u8]) -> RawReport {
        RawReport::from_slice(bytes)
    }

    #[test]
    fn discards_foreign_report_ids() {
        for id in (0..=u8::MAX).filter(|id| *id != 0x02) {
            assert_eq!(decode(&report(&[id, 0x01, 0x10, 0x00, 0x20, 0x00])), None);
        }
    }

    #[test]
    fn discards_idle_states() {
        assert_eq!(decode(&report(&[0x02, 0x00, 0x10, 0x00, 0x20, 0x00])), None);
        assert_eq!(decode(&report(&[0x02, 0x80, 0x10, 0x00, 0x20, 0x00])), None);
    }

    #[test]
    fn origin_with_tip_down() {
        assert_eq!(
            decode(&report(&[0x02, 0x01, 0, 0, 0, 0, 0, 0, 0, 0])),
            Some(PenSample {
                valid: true,
                in_contact: true,
                raw_x: 0,
                raw_y: 0,
            })
        );
    }

    #[test]
    fn hovering_pen_is_not_in_contact() {
        let sample = decode(&report(&[0x02, 0xe0, 0x34, 0x12, 0x78, 0x56])).unwrap();
        assert!(sample.valid);
        assert!(!sample.in_contact);
        assert_eq!(sample.raw_x, 0x1234);
        assert_eq!(sample.raw_y, 0x5678);
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let a = decode(&report(&[0x02, 0xe1, 1, 2, 3, 4, 0, 0, 0, 0])).unwrap();
        let b = decode(&report(&[0x02, 0xe1, 1, 2, 3, 4, 0xff, 0xff, 0xff, 0xff])).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn reserved_marker_with_tip_bit_is_accepted() {
        // 只有 0x80 本身是保留值，带笔尖位的 0x81 是正常帧
        let sample = decode(&report(&[0x02, 0x81, 0, 0, 0, 0])).unwrap();
        assert!(sample.in_contact);
    }
}
