use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use super::connection::Connection;
use super::decoder;
use crate::event_dispatcher::{CoordinateMapper, PointerEmitter, PointerSink};
use crate::input_devices::{DeviceError, TabletDevice};

/// 读循环：等待连接，读到设备丢失为止，然后重新等待
///
/// 断开期间阻塞在 `wait_connected` 上，不占用 CPU
pub async fn run<D, S>(connection: &Connection<D>, mut sink: S, mapper: CoordinateMapper)
where
    D: TabletDevice,
    S: PointerSink,
{
    loop {
        let device = connection.wait_connected().await;
        let reason = run_session(connection, device, &mut sink, mapper).await;
        debug!("session ended: {reason}");
    }
}

/// 一次连接会话
///
/// 每次会话都从一个新的 `PointerEmitter` 开始，笔尖状态不跨越重连。
/// 任何非 pending 的读错误都视为设备丢失：降级为断开并返回原因，之后不再产生任何事件
pub async fn run_session<D, S>(
    connection: &Connection<D>,
    device: Arc<D>,
    sink: &mut S,
    mapper: CoordinateMapper,
) -> DeviceError
where
    D: TabletDevice,
    S: PointerSink,
{
    let mut emitter = PointerEmitter::new(mapper);
    loop {
        let reading = device.clone();
        let result = tokio::task::spawn_blocking(move || reading.read_report()).await;
        let report = match result {
            Ok(Ok(report)) => report,
            Ok(Err(DeviceError::Pending)) => continue,
            Ok(Err(e)) => {
                connection.demote();
                info!("Tablet lost.");
                return e;
            }
            Err(e) => {
                warn!("read task failed: {e}");
                connection.demote();
                info!("Tablet lost.");
                return DeviceError::Disconnected;
            }
        };
        trace!("report {report:?}");

        // 不合法的帧很常见（比如笔悬停在感应范围外），直接丢弃
        let Some(sample) = decoder::decode(&report) else {
            continue;
        };
        let Some(frame) = emitter.process(&sample) else {
            continue;
        };
        trace!("frame {frame:?}");
        if let Err(e) = sink.submit(&frame) {
            warn!("pointer injection failed: {e:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::event_dispatcher::NORM_MAX;
    use crate::event_dispatcher::tests::RecordingSink;
    use crate::event_model::PointerEvent;
    use crate::input_devices::RawReport;
    use crate::tablet_driver::matcher::tests::FakeDevice;
    use crate::tablet_driver::{ConnectionState, DEVICE_X_EXTENT, DEVICE_Y_EXTENT};

    fn pen(state: u8, x: u16, y: u16) -> Result<RawReport, DeviceError> {
        let [x0, x1] = x.to_le_bytes();
        let [y0, y1] = y.to_le_bytes();
        Ok(RawReport::from_slice(&[0x02, state, x0, x1, y0, y1]))
    }

    fn junk(bytes: &[u8]) -> Result<RawReport, DeviceError> {
        Ok(RawReport::from_slice(bytes))
    }

    #[tokio::test]
    async fn session_emits_edges_and_demotes_on_failure() {
        let conn = Connection::new();
        conn.publish(FakeDevice::tablet().with_reads([
            pen(0x01, 0, 0),
            junk(&[0x02, 0x00, 1, 1, 1, 1]),
            junk(&[0x01, 0x01, 1, 1, 1, 1]),
            Err(DeviceError::Pending),
            pen(0x01, DEVICE_X_EXTENT, DEVICE_Y_EXTENT),
            pen(0xe0, DEVICE_X_EXTENT, DEVICE_Y_EXTENT),
            Err(DeviceError::Usb(rusb::Error::Io)),
            pen(0x01, 5, 5),
        ]))
        .unwrap();
        let device = conn.current_handle().unwrap();
        let mut sink = RecordingSink::default();

        let reason =
            run_session(&conn, device.clone(), &mut sink, CoordinateMapper::default()).await;

        assert!(matches!(reason, DeviceError::Usb(rusb::Error::Io)));
        assert_eq!(conn.state(), ConnectionState::Disconnected);
        assert_eq!(
            sink.events,
            vec![
                PointerEvent::Move { x: 0, y: 0 },
                PointerEvent::ButtonDown,
                PointerEvent::Move {
                    x: NORM_MAX,
                    y: NORM_MAX
                },
                PointerEvent::Move {
                    x: NORM_MAX,
                    y: NORM_MAX
                },
                PointerEvent::ButtonUp,
            ]
        );
        // 失败之后不会再读
        assert_eq!(device.reads.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn sink_failure_does_not_stop_reading() {
        let conn = Connection::new();
        conn.publish(FakeDevice::tablet().with_reads([pen(0x01, 1, 1), pen(0x01, 2, 2)]))
            .unwrap();
        let device = conn.current_handle().unwrap();
        let mut sink = RecordingSink {
            fail: true,
            ..Default::default()
        };

        let reason =
            run_session(&conn, device.clone(), &mut sink, CoordinateMapper::default()).await;

        // 两帧都被读完，最终因为设备耗尽而断开
        assert!(matches!(reason, DeviceError::Disconnected));
        assert!(device.reads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn loop_idles_until_reconnect_and_resets_contact() {
        let conn = Connection::new();
        let mut sink = RecordingSink::default();

        // 第一次会话结束时笔尖仍是按下状态
        conn.publish(FakeDevice::tablet().with_reads([pen(0x01, 0, 0)]))
            .unwrap();
        let idle = tokio::time::timeout(
            Duration::from_millis(50),
            run(&conn, &mut sink, CoordinateMapper::default()),
        )
        .await;
        assert!(idle.is_err());
        assert_eq!(conn.state(), ConnectionState::Disconnected);
        assert_eq!(
            sink.events,
            vec![PointerEvent::Move { x: 0, y: 0 }, PointerEvent::ButtonDown]
        );

        // 断开期间没有任何事件
        let before = sink.events.len();
        let idle = tokio::time::timeout(
            Duration::from_millis(20),
            run(&conn, &mut sink, CoordinateMapper::default()),
        )
        .await;
        assert!(idle.is_err());
        assert_eq!(sink.events.len(), before);

        // 重新连接后按下状态重新开始计算
        sink.events.clear();
        conn.publish(FakeDevice::tablet().with_reads([pen(0x01, 0, 0)]))
            .unwrap();
        let _ = tokio::time::timeout(
            Duration::from_millis(50),
            run(&conn, &mut sink, CoordinateMapper::default()),
        )
        .await;
        assert_eq!(
            sink.events,
            vec![PointerEvent::Move { x: 0, y: 0 }, PointerEvent::ButtonDown]
        );
    }
}
