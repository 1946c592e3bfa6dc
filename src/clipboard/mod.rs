//! 剪贴板管理模块
//!
//! # 设计思路
//!
//! 统一管理剪贴板相关的核心能力：
//! - **网关**：`ClipboardGateway` 收敛文本探测、图片读取、位图写入三个操作，
//!   每个操作独立获取并释放剪贴板
//! - **状态机**：`WatchState` + `handle_clipboard_change` 负责去重、裁剪、写回，
//!   以及“自身写入”的一次性忽略标志
//! - **监听**：通过 `clipboard-master` 接收系统变化通知，支持跨线程退出
//!
//! # 实现思路
//!
//! - 状态只在监听线程内通过 `&mut` 修改，单写者约束由类型系统体现，无需原子量或锁。
//! - 网关以 trait 暴露，核心流程可以脱离真实剪贴板进行测试。
//! - 子模块按职责拆分：访问归 `gateway`，流程归 `watch`，事件源归 `listener`。

pub mod gateway;
pub mod listener;
pub mod watch;

pub use gateway::{ClipboardGateway, SystemClipboard};
pub use listener::{run_listener, RestartBackoff, ShutdownHandle};
pub use watch::{handle_clipboard_change, ChangeOutcome, ImageWatcher, WatchOptions, WatchState};
