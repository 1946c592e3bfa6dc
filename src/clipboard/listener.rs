//! # 剪贴板监听模块
//!
//! ## 设计思路
//!
//! 通过 `clipboard-master` 注册系统剪贴板变化回调，把每条通知同步交给
//! `ImageWatcher` 处理。监听循环运行在调用线程上，该线程因此独占全部剪贴板访问
//! 与 `WatchState`。
//!
//! ## 实现思路
//!
//! - `ShutdownHandle` 可跨线程克隆：原子标志 + 当前监听器的关闭通道。
//!   托盘菜单的“退出”或启动器调用 `request()` 即可让循环退出。
//! - 首次注册失败属于启动错误，直接返回；运行中监听意外退出则按 `RestartBackoff`
//!   指数退避重启，起始与上限延迟来自配置。
//! - 退避等待按小片段睡眠，期间持续检查关闭标志，避免退出被拖延。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use clipboard_master::{CallbackResult, ClipboardHandler, Master, Shutdown};

use super::gateway::ClipboardGateway;
use super::watch::ImageWatcher;
use crate::config::AppConfig;
use crate::error::AppError;

const SHUTDOWN_POLL_SLICE: Duration = Duration::from_millis(50);

/// 监听意外退出后的重启退避：第 n 次重启等待 `base * 2^(n-1)`，不超过 `max`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartBackoff {
    pub base: Duration,
    pub max: Duration,
}

impl RestartBackoff {
    pub fn delay(&self, restart_attempt: u32) -> Duration {
        let doublings = restart_attempt.saturating_sub(1).min(16);
        self.base.saturating_mul(1 << doublings).min(self.max)
    }
}

impl Default for RestartBackoff {
    fn default() -> Self {
        RestartBackoff::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for RestartBackoff {
    fn from(config: &AppConfig) -> Self {
        Self {
            base: Duration::from_millis(config.restart_base_delay_ms),
            max: Duration::from_millis(config.restart_max_delay_ms),
        }
    }
}

// ============================================================================
// 关闭信号
// ============================================================================

#[derive(Default)]
struct ShutdownInner {
    requested: AtomicBool,
    channel: Mutex<Option<Shutdown>>,
}

/// 跨线程的关闭请求句柄。
///
/// # 示例
/// ```rust,no_run
/// use clipboard_border_cropper::clipboard::ShutdownHandle;
///
/// let shutdown = ShutdownHandle::new();
/// let for_tray = shutdown.clone();
/// std::thread::spawn(move || {
///     // ... 托盘菜单点击“退出” ...
///     for_tray.request();
/// });
/// ```
#[derive(Clone, Default)]
pub struct ShutdownHandle {
    inner: Arc<ShutdownInner>,
}

impl ShutdownHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// 请求退出：设置标志并唤醒正在运行的监听器。
    pub fn request(&self) {
        if self.inner.requested.swap(true, Ordering::SeqCst) {
            return;
        }
        log::info!("🛑 收到退出请求");
        if let Some(channel) = self.lock_channel().take() {
            channel.signal();
        }
    }

    pub fn is_requested(&self) -> bool {
        self.inner.requested.load(Ordering::SeqCst)
    }

    /// 记录当前监听器的关闭通道；若此前已请求退出则立即发信号。
    fn install(&self, channel: Shutdown) {
        let mut slot = self.lock_channel();
        if self.is_requested() {
            channel.signal();
        } else {
            *slot = Some(channel);
        }
    }

    fn clear(&self) {
        self.lock_channel().take();
    }

    fn lock_channel(&self) -> MutexGuard<'_, Option<Shutdown>> {
        match self.inner.channel.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("关闭通道锁中毒，继续使用恢复数据");
                poisoned.into_inner()
            }
        }
    }

    /// 睡眠至多 `total`，期间收到退出请求则提前返回 `true`。
    fn sleep_unless_requested(&self, total: Duration) -> bool {
        let mut remaining = total;
        while !remaining.is_zero() {
            if self.is_requested() {
                return true;
            }
            let slice = remaining.min(SHUTDOWN_POLL_SLICE);
            thread::sleep(slice);
            remaining -= slice;
        }
        self.is_requested()
    }
}

// ============================================================================
// 剪贴板监控
// ============================================================================

/// 剪贴板事件处理器（内部实现）
///
/// 每条通知同步交给 `ImageWatcher`，处理完才接收下一条。
struct Handler<'a, G> {
    watcher: &'a mut ImageWatcher<G>,
    shutdown: ShutdownHandle,
}

impl<G> Handler<'_, G> {
    fn next_or_stop(&self) -> CallbackResult {
        if self.shutdown.is_requested() {
            CallbackResult::Stop
        } else {
            CallbackResult::Next
        }
    }
}

impl<G: ClipboardGateway> ClipboardHandler for Handler<'_, G> {
    fn on_clipboard_change(&mut self) -> CallbackResult {
        if self.shutdown.is_requested() {
            log::debug!("🛑 已请求退出，丢弃剪贴板变化通知");
            return CallbackResult::Stop;
        }

        let outcome = self.watcher.on_change();
        log::trace!("📋 剪贴板变化处理结果: {:?}", outcome);
        self.next_or_stop()
    }

    fn on_clipboard_error(&mut self, error: std::io::Error) -> CallbackResult {
        log::error!("剪贴板错误：{}", error);
        self.next_or_stop()
    }
}

/// 在当前线程运行剪贴板监听，直到收到退出请求。
///
/// 首次注册监听失败时返回 `AppError::Listener`；之后的意外退出会自动重启。
pub fn run_listener<G: ClipboardGateway>(
    watcher: &mut ImageWatcher<G>,
    shutdown: &ShutdownHandle,
    backoff: RestartBackoff,
) -> Result<(), AppError> {
    let margin = watcher.options().margin;
    let mut restart_attempt: u32 = 0;
    let mut started_once = false;

    while !shutdown.is_requested() {
        let handler = Handler {
            watcher: &mut *watcher,
            shutdown: shutdown.clone(),
        };

        match Master::new(handler) {
            Ok(mut master) => {
                shutdown.install(master.shutdown_channel());
                restart_attempt = 0;
                started_once = true;
                log::info!("📋 剪贴板监听已启动（margin={}）", margin);

                let result = master.run();
                shutdown.clear();
                if shutdown.is_requested() {
                    break;
                }

                match result {
                    Ok(()) => log::warn!("📋 剪贴板监听已退出，将尝试重启"),
                    Err(err) => log::warn!("📋 剪贴板监听异常退出: {}，将尝试重启", err),
                }
            }
            Err(err) if !started_once => {
                return Err(AppError::Listener(format!("创建剪贴板监听失败: {}", err)));
            }
            Err(err) => {
                log::error!("📋 创建剪贴板监听失败: {}", err);
            }
        }

        restart_attempt = restart_attempt.saturating_add(1);
        let delay = backoff.delay(restart_attempt);
        log::warn!(
            "📋 剪贴板监听 {}ms 后重试（attempt={}）",
            delay.as_millis(),
            restart_attempt
        );
        if shutdown.sleep_unless_requested(delay) {
            break;
        }
    }

    log::info!("📋 剪贴板监听已停止");
    Ok(())
}
