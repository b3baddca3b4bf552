use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::runtime::Runtime;
use tracing::info;

/// 退出时留给后台任务收尾的时间
pub const SHUTDOWN_GRACE: Duration = Duration::from_millis(200);

/// 在 `runtime` 上运行 `work`，直到它结束或 `signal` 触发
///
/// 笔不在感应范围内时设备不发任何报告，阻塞读可能永远不返回；
/// 直接 drop `Runtime` 会一直等它，所以这里用 `shutdown_timeout` 放弃仍在阻塞的任务
pub fn run_until<W, S>(runtime: Runtime, work: W, signal: S, grace: Duration) -> Result<()>
where
    W: Future<Output = Result<()>>,
    S: Future<Output = std::io::Result<()>>,
{
    let result = runtime.block_on(async {
        tokio::select! {
            result = work => result,
            signal = signal => {
                signal.context("tokio::signal::ctrl_c")?;
                info!("exiting");
                Ok(())
            }
        }
    });
    runtime.shutdown_timeout(grace);
    result
}
