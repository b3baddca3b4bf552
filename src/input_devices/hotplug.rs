use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use rusb::{Context, Device, Hotplug, HotplugBuilder, Registration, UsbContext};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, trace, warn};

use super::{DeviceError, DeviceSource};

/// libusb 热插拔回调：只负责把到达的设备转交给 watcher
///
/// 回调运行在 libusb 的事件线程上，不能在这里做同步 I/O
struct ArrivalForwarder {
    tx: UnboundedSender<Device<Context>>,
}

impl Hotplug<Context> for ArrivalForwarder {
    fn device_arrived(&mut self, device: Device<Context>) {
        trace!(
            "usb arrival: bus {} device {}",
            device.bus_number(),
            device.address()
        );
        if self.tx.send(device).is_err() {
            debug!("arrival dropped, watcher is gone");
        }
    }

    fn device_left(&mut self, device: Device<Context>) {
        // 拔出由读循环的读失败感知，这里只记日志
        trace!(
            "usb removal: bus {} device {}",
            device.bus_number(),
            device.address()
        );
    }
}

/// 注册热插拔通知；libusb 不支持时返回 `None`
///
/// 返回的 `Registration` 需要在进程生命周期内一直持有
pub fn register(
    context: &Context,
    tx: UnboundedSender<Device<Context>>,
) -> Result<Option<Registration<Context>>, DeviceError> {
    if !rusb::has_hotplug() {
        return Ok(None);
    }
    let callback: Box<dyn Hotplug<Context>> = Box::new(ArrivalForwarder { tx });
    let registration = HotplugBuilder::new()
        .enumerate(false)
        .register(context, callback)?;
    Ok(Some(registration))
}

const EVENT_RETRY_MIN: Duration = Duration::from_millis(10);
const EVENT_RETRY_MAX: Duration = Duration::from_secs(5);

/// libusb 事件线程，热插拔回调在这里被调用
pub fn spawn_event_thread(context: Context) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("libusb-events".to_string())
        .spawn(move || {
            let e = pump_events(
                || context.handle_events(None),
                EVENT_RETRY_MIN,
                EVENT_RETRY_MAX,
            );
            warn!("libusb event thread stopped: {e}");
        })
}

/// 反复调用 `handle_events`，只在遇到无法恢复的错误时返回
///
/// 连续出错时等待时间从 `min` 开始翻倍，最多 `max`；成功一次后重置
fn pump_events<F>(mut handle_events: F, min: Duration, max: Duration) -> rusb::Error
where
    F: FnMut() -> rusb::Result<()>,
{
    let mut delay = min;
    loop {
        match handle_events() {
            Ok(()) => delay = min,
            Err(e @ (rusb::Error::NoMem | rusb::Error::NotSupported)) => return e,
            Err(e) => {
                // 只在第一次失败时告警，退避期间降到 debug
                if delay == min {
                    warn!("libusb event handling failed: {e}");
                } else {
                    debug!("libusb event handling failed again: {e}");
                }
                std::thread::sleep(delay);
                delay = (delay * 2).min(max);
            }
        }
    }
}

/// 没有热插拔能力时的退路：定期枚举，把所有候选设备当作“到达”送给 watcher
pub async fn poll_arrivals<S: DeviceSource>(
    source: Arc<S>,
    tx: UnboundedSender<S::Token>,
    interval: Duration,
) {
    info!("hotplug unsupported, polling every {interval:?}");
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let source = source.clone();
        let tokens = match tokio::task::spawn_blocking(move || source.enumerate()).await {
            Ok(Ok(tokens)) => tokens,
            Ok(Err(e)) => {
                warn!("enumeration failed: {e}");
                continue;
            }
            Err(e) => {
                warn!("enumeration task failed: {e}");
                continue;
            }
        };
        for token in tokens {
            if tx.send(token).is_err() {
                return;
            }
        }
    }
}
