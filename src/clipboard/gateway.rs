//! # 剪贴板网关模块
//!
//! ## 设计思路
//!
//! 把与系统剪贴板的全部交互收敛到 `ClipboardGateway` trait 的三个操作上，
//! 监听循环只依赖该 trait，测试时可用内存实现替换。
//!
//! 每个操作独立完成“获取 → 操作 → 释放”，不长期占用剪贴板；
//! 获取失败（被其他进程占用）以 `AppError::ClipboardBusy` 返回，本层不重试。
//!
//! ## 实现思路
//!
//! - 读取：统一走 `arboard`，它能识别 DIB / DIBV5 / PNG 等常见位图格式。
//! - 写入（Windows）：先在锁外编码为无文件头 DIB，再
//!   `OpenClipboard → EmptyClipboard → SetClipboardData(CF_DIB) → CloseClipboard`，
//!   关闭由 `ClipboardLock` 的 `Drop` 保证，任何返回路径都会释放。
//! - 写入（其他平台）：交给 `arboard::set_image`，由其完成平台原生转换。

use std::borrow::Cow;

use image::DynamicImage;

use crate::error::AppError;
use crate::image_handler::image_from_rgba;

/// 剪贴板访问接口。
pub trait ClipboardGateway {
    /// 剪贴板中是否存在纯文本或 Unicode 文本。
    fn probe_text_available(&mut self) -> Result<bool, AppError>;

    /// 读取剪贴板中的图片；没有图片或无法解码时返回 `Ok(None)`。
    fn read_image(&mut self) -> Result<Option<DynamicImage>, AppError>;

    /// 用 `image` 替换剪贴板的全部内容。
    fn write_image(&mut self, image: &DynamicImage) -> Result<(), AppError>;

    /// `image` 写入后再读回时的样子，去重哈希基于它计算。
    ///
    /// 默认无损；有损的写入格式（如丢弃 Alpha 的 DIB）需覆盖。
    fn as_written<'a>(&self, image: &'a DynamicImage) -> Cow<'a, DynamicImage> {
        Cow::Borrowed(image)
    }
}

/// 系统剪贴板实现。
pub struct SystemClipboard {
    clipboard: arboard::Clipboard,
    max_pixels: u64,
}

impl SystemClipboard {
    /// 创建剪贴板上下文。
    ///
    /// 该步骤失败属于启动阶段错误。
    pub fn new(max_pixels: u64) -> Result<Self, AppError> {
        let clipboard = arboard::Clipboard::new()
            .map_err(|e| AppError::Clipboard(format!("无法访问剪贴板：{}", e)))?;
        Ok(Self {
            clipboard,
            max_pixels,
        })
    }
}

impl ClipboardGateway for SystemClipboard {
    fn probe_text_available(&mut self) -> Result<bool, AppError> {
        platform::probe_text_available(&mut self.clipboard)
    }

    fn read_image(&mut self) -> Result<Option<DynamicImage>, AppError> {
        let data = match self.clipboard.get_image() {
            Ok(data) => data,
            Err(arboard::Error::ClipboardOccupied) => {
                return Err(AppError::ClipboardBusy("读取图片时剪贴板被占用".to_string()));
            }
            Err(err) => {
                log::debug!("📋 剪贴板中没有可解码的图片: {}", err);
                return Ok(None);
            }
        };

        let image = image_from_rgba(data.width, data.height, data.bytes.into_owned(), self.max_pixels)?;
        Ok(Some(image))
    }

    fn write_image(&mut self, image: &DynamicImage) -> Result<(), AppError> {
        platform::write_image(&mut self.clipboard, image)
    }

    fn as_written<'a>(&self, image: &'a DynamicImage) -> Cow<'a, DynamicImage> {
        platform::as_written(image)
    }
}

// ============================================================================
// Windows 原生实现 — 编码前置于剪贴板锁之外
// ============================================================================

#[cfg(target_os = "windows")]
mod platform {
    use super::*;
    use std::ptr::copy_nonoverlapping;

    use windows::Win32::Foundation::{GlobalFree, HANDLE};
    use windows::Win32::System::DataExchange::{
        CloseClipboard, EmptyClipboard, IsClipboardFormatAvailable, OpenClipboard,
        SetClipboardData,
    };
    use windows::Win32::System::Memory::{GlobalAlloc, GlobalLock, GlobalUnlock, GMEM_MOVEABLE};
    use windows::Win32::System::Ole::{CF_DIB, CF_TEXT, CF_UNICODETEXT};

    use crate::image_handler::{encode_dib, flatten_alpha};

    /// 剪贴板打开状态的 RAII 守卫，`Drop` 时关闭剪贴板。
    struct ClipboardLock;

    impl ClipboardLock {
        fn acquire() -> Result<Self, AppError> {
            unsafe { OpenClipboard(None) }
                .map_err(|e| AppError::ClipboardBusy(format!("打开剪贴板失败: {}", e)))?;
            Ok(Self)
        }
    }

    impl Drop for ClipboardLock {
        fn drop(&mut self) {
            if let Err(err) = unsafe { CloseClipboard() } {
                log::warn!("关闭剪贴板失败: {}", err);
            }
        }
    }

    pub(super) fn probe_text_available(_clipboard: &mut arboard::Clipboard) -> Result<bool, AppError> {
        let _lock = ClipboardLock::acquire()?;
        let available = [CF_UNICODETEXT, CF_TEXT]
            .iter()
            .any(|format| unsafe { IsClipboardFormatAvailable(u32::from(format.0)) }.is_ok());
        Ok(available)
    }

    /// 仅写入 24 位 `CF_DIB`，读回时 Alpha 为 255。
    pub(super) fn as_written(image: &DynamicImage) -> Cow<'_, DynamicImage> {
        if image.color().has_alpha() {
            Cow::Owned(flatten_alpha(image))
        } else {
            Cow::Borrowed(image)
        }
    }

    pub(super) fn write_image(
        _clipboard: &mut arboard::Clipboard,
        image: &DynamicImage,
    ) -> Result<(), AppError> {
        // ── 预编码阶段（不持有剪贴板锁）──
        let dib = encode_dib(image)?;

        // ── 写入阶段 ──
        let _lock = ClipboardLock::acquire()?;
        unsafe { EmptyClipboard() }
            .map_err(|e| AppError::Clipboard(format!("清空剪贴板失败: {}", e)))?;
        unsafe { set_global_data(u32::from(CF_DIB.0), &dib) }
    }

    /// 将字节写入全局内存并 SetClipboardData。
    unsafe fn set_global_data(format_id: u32, data: &[u8]) -> Result<(), AppError> {
        let hglobal = unsafe { GlobalAlloc(GMEM_MOVEABLE, data.len()) }
            .map_err(|e| AppError::Clipboard(format!("GlobalAlloc 失败: {}", e)))?;

        let ptr = unsafe { GlobalLock(hglobal) } as *mut u8;
        if ptr.is_null() {
            let _ = unsafe { GlobalFree(Some(hglobal)) };
            return Err(AppError::Clipboard("GlobalLock 返回空指针".to_string()));
        }

        unsafe {
            copy_nonoverlapping(data.as_ptr(), ptr, data.len());
            let _ = GlobalUnlock(hglobal);
        }

        // 成功后内存归系统所有，不可再释放
        if let Err(e) = unsafe { SetClipboardData(format_id, Some(HANDLE(hglobal.0))) } {
            let _ = unsafe { GlobalFree(Some(hglobal)) };
            return Err(AppError::Clipboard(format!("SetClipboardData 失败: {}", e)));
        }

        Ok(())
    }
}

// ============================================================================
// 非 Windows 回退方案 — 沿用 arboard
// ============================================================================

#[cfg(not(target_os = "windows"))]
mod platform {
    use super::*;

    /// arboard 以 RGBA 写入，读回无损。
    pub(super) fn as_written(image: &DynamicImage) -> Cow<'_, DynamicImage> {
        Cow::Borrowed(image)
    }

    pub(super) fn probe_text_available(clipboard: &mut arboard::Clipboard) -> Result<bool, AppError> {
        match clipboard.get_text() {
            Ok(_) => Ok(true),
            Err(arboard::Error::ContentNotAvailable) => Ok(false),
            Err(arboard::Error::ClipboardOccupied) => {
                Err(AppError::ClipboardBusy("读取文本时剪贴板被占用".to_string()))
            }
            Err(err) => {
                log::debug!("📋 文本探测失败，按无文本处理: {}", err);
                Ok(false)
            }
        }
    }

    pub(super) fn write_image(
        clipboard: &mut arboard::Clipboard,
        image: &DynamicImage,
    ) -> Result<(), AppError> {
        let rgba = image.to_rgba8();
        let image_data = arboard::ImageData {
            width: rgba.width() as usize,
            height: rgba.height() as usize,
            bytes: Cow::Owned(rgba.into_raw()),
        };

        clipboard.set_image(image_data).map_err(|err| match err {
            arboard::Error::ClipboardOccupied => {
                AppError::ClipboardBusy("写入图片时剪贴板被占用".to_string())
            }
            other => AppError::Clipboard(format!("复制失败：{}", other)),
        })
    }
}
