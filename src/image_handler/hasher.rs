//! # 内容哈希模块
//!
//! 对图片的规范化无损表示（宽、高、RGBA8 像素）计算 SHA-256，
//! 供监听循环判断“这张图是否已经处理过”。
//! 同样的像素内容与尺寸必然得到同样的摘要，与解码出的像素格式无关。

use std::borrow::Cow;
use std::fmt;

use image::{DynamicImage, RgbaImage};
use sha2::{Digest, Sha256};

/// 图片内容摘要（SHA-256）。
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// 前 12 位十六进制，用于日志。
    pub fn short(&self) -> String {
        self.to_string().chars().take(12).collect()
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.short())
    }
}

/// 计算图片内容摘要。
pub fn hash_image(image: &DynamicImage) -> ContentHash {
    let rgba: Cow<'_, RgbaImage> = match image.as_rgba8() {
        Some(buf) => Cow::Borrowed(buf),
        None => Cow::Owned(image.to_rgba8()),
    };

    let mut hasher = Sha256::new();
    hasher.update(rgba.width().to_le_bytes());
    hasher.update(rgba.height().to_le_bytes());
    hasher.update(rgba.as_raw());

    let mut digest = [0u8; 32];
    digest.copy_from_slice(&hasher.finalize());
    ContentHash(digest)
}
