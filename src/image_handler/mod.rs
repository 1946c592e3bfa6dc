//! # 图片处理模块（image_handler）
//!
//! ## 设计思路
//!
//! 该模块只处理“像素”，不关心剪贴板与事件循环：
//!
//! - `cropper`：纯色边框检测与裁剪（核心算法）
//! - `hasher`：图片内容摘要，用于去重
//! - `dib`：编码为剪贴板使用的无文件头位图
//! - `loader`：RGBA 字节 / 文件 → `DynamicImage`，含像素上限校验
//! - `error`：图片链路统一错误
//!
//! ## 调用链
//!
//! ```text
//! clipboard::watch
//!    ├─ hasher::hash_image      （去重）
//!    ├─ cropper::crop_borders   （裁剪 + 补边）
//!    └─ gateway.write_image
//!          └─ dib::encode_dib   （Windows 写入前预编码）
//! ```

pub mod cropper;
mod dib;
mod error;
mod hasher;
mod loader;

use std::path::Path;

pub use cropper::{crop_borders, BoundingBox, CropOutcome, CropPlan, Shortfall};
pub use dib::{encode_dib, flatten_alpha, BITMAP_FILE_HEADER_LEN};
pub use error::ImageError;
pub use hasher::{hash_image, ContentHash};
pub use loader::{image_from_rgba, load_image_file, save_image_file};

/// 文件模式：读取 `input`，裁剪后写入 `output`。
///
/// 未检测到前景时原样写出，并返回 `CropOutcome::NoForeground`。
pub fn crop_file(
    input: &Path,
    output: &Path,
    margin: u32,
    max_pixels: u64,
) -> Result<CropOutcome, ImageError> {
    let image = load_image_file(input, max_pixels)?;
    let outcome = crop_borders(&image, margin);

    match &outcome {
        CropOutcome::Cropped { bbox, image } => log::info!(
            "✂️ 裁剪完成 - 前景: ({}, {})-({}, {}) 输出尺寸: {}x{}",
            bbox.left,
            bbox.top,
            bbox.right,
            bbox.bottom,
            image.width(),
            image.height()
        ),
        CropOutcome::NoForeground(_) => {
            log::warn!("⚠️ 未检测到对象，原样输出: {}", input.display())
        }
    }

    save_image_file(outcome.image(), output)?;
    Ok(outcome)
}
