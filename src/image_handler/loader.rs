//! # 加载模块
//!
//! ## 设计思路
//!
//! 负责把外部数据变成可处理的 `DynamicImage`：
//! - 剪贴板给出的原始 RGBA 字节（需校验长度与像素上限）
//! - 本地图片文件（先读 header 尺寸做快速拒绝，再完整解码）
//!
//! 以及把裁剪结果保存回文件（仅文件模式使用）。

use std::path::Path;

use image::{DynamicImage, ImageReader, RgbaImage};

use super::ImageError;

/// 由剪贴板 RGBA 字节构建图片。
///
/// 校验 `bytes.len() == width * height * 4`，并按 `max_pixels` 拒绝超大图片。
pub fn image_from_rgba(
    width: usize,
    height: usize,
    bytes: Vec<u8>,
    max_pixels: u64,
) -> Result<DynamicImage, ImageError> {
    let width = u32::try_from(width)
        .map_err(|_| ImageError::ResourceLimit(format!("图片宽度超出范围：{}", width)))?;
    let height = u32::try_from(height)
        .map_err(|_| ImageError::ResourceLimit(format!("图片高度超出范围：{}", height)))?;
    validate_pixel_limits(width, height, max_pixels)?;

    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(4))
        .ok_or_else(|| ImageError::ResourceLimit("图片尺寸导致内存溢出风险".to_string()))?;

    if bytes.len() != expected_len {
        return Err(ImageError::Decode(format!(
            "像素长度不匹配: 期望 {} 实际 {}",
            expected_len,
            bytes.len()
        )));
    }

    RgbaImage::from_raw(width, height, bytes)
        .map(DynamicImage::ImageRgba8)
        .ok_or_else(|| ImageError::Decode("创建图像缓冲区失败".to_string()))
}

/// 从文件加载图片。
pub fn load_image_file(path: &Path, max_pixels: u64) -> Result<DynamicImage, ImageError> {
    let (width, height) = ImageReader::open(path)
        .map_err(|e| ImageError::FileSystem(format!("打开 {} 失败：{}", path.display(), e)))?
        .with_guessed_format()
        .map_err(|e| ImageError::InvalidFormat(format!("无法识别图片格式：{}", e)))?
        .into_dimensions()
        .map_err(|e| ImageError::InvalidFormat(format!("无法读取图片尺寸：{}", e)))?;
    validate_pixel_limits(width, height, max_pixels)?;

    let image = ImageReader::open(path)
        .map_err(|e| ImageError::FileSystem(format!("打开 {} 失败：{}", path.display(), e)))?
        .with_guessed_format()
        .map_err(|e| ImageError::InvalidFormat(format!("无法识别图片格式：{}", e)))?
        .decode()
        .map_err(|e| ImageError::Decode(format!("图片解码失败：{}", e)))?;

    log::info!(
        "🖼️ 已加载图片 - 来源: {} 尺寸: {}x{}",
        path.display(),
        image.width(),
        image.height()
    );
    Ok(image)
}

/// 保存图片，格式由扩展名决定。
pub fn save_image_file(image: &DynamicImage, path: &Path) -> Result<(), ImageError> {
    image
        .save(path)
        .map_err(|e| ImageError::FileSystem(format!("保存 {} 失败：{}", path.display(), e)))
}

/// 校验像素数量是否超过上限。
fn validate_pixel_limits(width: u32, height: u32, max_pixels: u64) -> Result<(), ImageError> {
    let pixels = u64::from(width) * u64::from(height);
    if pixels > max_pixels {
        return Err(ImageError::ResourceLimit(format!(
            "图片像素过大：{} 像素（限制：{} 像素）",
            pixels, max_pixels
        )));
    }
    Ok(())
}
