//! # 剪贴板图片去边工具 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  main.rs  启动：日志 · 配置 · 文件模式 / 监听模式          │
//! └───────┬──────────────────────────────────────────────────┘
//!         ↓
//! ┌───────┼──────────────────────────────────────────────────┐
//! │  ┌─ error ────── AppError (统一错误类型)                  │
//! │  ├─ config ───── AppConfig (JSON，启动时读取一次)         │
//! │  ├─ signal ───── 进程信号 → ShutdownHandle::request       │
//! │  │                                                       │
//! │  ├─ clipboard                                            │
//! │  │   ├─ listener  clipboard-master 事件源 + 退出信号      │
//! │  │   ├─ watch     去重 · 裁剪 · 写回 · 忽略标志状态机      │
//! │  │   └─ gateway   文本探测 / 读图 / 写 DIB                │
//! │  │                                                       │
//! │  └─ image_handler                                        │
//! │      ├─ cropper   纯色边框检测与补边裁剪                  │
//! │      ├─ hasher    SHA-256 内容摘要                        │
//! │      ├─ dib       无文件头位图编码                        │
//! │      └─ loader    RGBA 字节 / 文件解码 + 像素上限          │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError` |
//! | [`config`] | 边距、忽略窗口、像素上限、日志级别 |
//! | [`clipboard`] | 剪贴板监听、状态机、网关 |
//! | [`image_handler`] | 裁剪算法、哈希、编码、加载 |
//! | [`signal`] | Ctrl-C / SIGTERM → 退出请求 |

pub mod clipboard;
pub mod config;
pub mod error;
pub mod image_handler;
pub mod signal;
