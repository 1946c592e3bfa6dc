//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义全局统一的 `AppError` 枚举，所有对外可失败的操作统一返回
//! `Result<T, AppError>`，监听循环据此决定“记录日志并丢弃本次通知”
//! 还是“启动阶段直接失败”。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `ImageError` 提供 `From` 转换，无需手动 map。
//! - `ClipboardBusy` 单独成枝：剪贴板被其他进程占用属于可恢复错误。

use crate::image_handler::ImageError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 剪贴板被其他进程占用，本次通知应直接丢弃
    #[error("剪贴板被占用: {0}")]
    ClipboardBusy(String),

    /// 剪贴板读写操作失败
    #[error("剪贴板操作失败: {0}")]
    Clipboard(String),

    /// 图片处理流水线错误（解码 / 编码 / 资源限制）
    #[error("{0}")]
    Image(#[from] ImageError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 配置文件无法解析
    #[error("配置错误: {0}")]
    Config(String),

    /// 剪贴板监听注册失败（启动阶段致命）
    #[error("剪贴板监听失败: {0}")]
    Listener(String),
}

impl AppError {
    /// 是否为“剪贴板被占用”这类可恢复错误。
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::ClipboardBusy(_))
    }
}
