//! # 退出信号模块
//!
//! ## 设计思路
//!
//! 监听线程被 `clipboard-master` 的消息循环阻塞，进程信号不能直接打断它。
//! 这里在独立线程上运行一个单线程 tokio 运行时，等待 Ctrl-C / SIGTERM
//! （Windows 下还包括控制台关闭与系统关机），收到后调用
//! `ShutdownHandle::request()`，由监听器正常注销并退出。

use std::io;
use std::thread::{self, JoinHandle};

use crate::clipboard::ShutdownHandle;
use crate::error::AppError;

/// 启动信号监听线程。
///
/// 运行时或线程创建失败属于启动错误。
pub fn spawn_signal_watcher(shutdown: ShutdownHandle) -> Result<JoinHandle<()>, AppError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let handle = thread::Builder::new()
        .name("signal-watcher".to_string())
        .spawn(move || {
            runtime.block_on(async {
                match wait_for_signal().await {
                    Ok(name) => {
                        log::info!("🛑 收到 {} 信号，准备退出", name);
                        shutdown.request();
                    }
                    Err(err) => log::warn!("⚠️ 注册退出信号失败，仅能通过托盘退出: {}", err),
                }
            });
        })?;

    Ok(handle)
}

#[cfg(unix)]
async fn wait_for_signal() -> io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.map(|()| "Ctrl-C"),
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

#[cfg(windows)]
async fn wait_for_signal() -> io::Result<&'static str> {
    use tokio::signal::windows::{ctrl_close, ctrl_shutdown};

    let mut close = ctrl_close()?;
    let mut shutdown = ctrl_shutdown()?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.map(|()| "Ctrl-C"),
        _ = close.recv() => Ok("CTRL_CLOSE"),
        _ = shutdown.recv() => Ok("CTRL_SHUTDOWN"),
    }
}

#[cfg(not(any(unix, windows)))]
async fn wait_for_signal() -> io::Result<&'static str> {
    tokio::signal::ctrl_c().await.map(|()| "Ctrl-C")
}
