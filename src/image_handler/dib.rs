//! # DIB 编码模块
//!
//! ## 设计思路
//!
//! Windows 剪贴板的 `CF_DIB` 格式存放的是 BMP 去掉 14 字节文件头
//! （`BITMAPFILEHEADER`）后的部分：`BITMAPINFOHEADER` + 像素数据。
//! 这里复用 `image` 的 BMP 编码器，再剥掉文件头。
//!
//! 编码与平台无关，可在任意平台测试；写剪贴板时在打开剪贴板之前完成编码，
//! 使剪贴板被锁定的窗口尽量短。

use image::codecs::bmp::BmpEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder};

use super::ImageError;

/// `BITMAPFILEHEADER` 长度（字节）。
pub const BITMAP_FILE_HEADER_LEN: usize = 14;

/// DIB 写入后剪贴板上实际保存的内容：丢弃 Alpha 的 RGB8 图片。
///
/// 读回时 Alpha 恒为 255，去重哈希必须基于这一表示计算。
pub fn flatten_alpha(image: &DynamicImage) -> DynamicImage {
    DynamicImage::ImageRgb8(image.to_rgb8())
}

/// 将图片编码为不带文件头的 24 位 DIB。
///
/// Alpha 通道被丢弃，与系统“位图”剪贴板格式的惯例一致。
pub fn encode_dib(image: &DynamicImage) -> Result<Vec<u8>, ImageError> {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    if width == 0 || height == 0 {
        return Err(ImageError::Encode(format!("无法编码空图片：{}x{}", width, height)));
    }

    let mut bmp = Vec::new();
    BmpEncoder::new(&mut bmp)
        .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
        .map_err(|e| ImageError::Encode(format!("BMP 编码失败：{}", e)))?;

    if bmp.len() <= BITMAP_FILE_HEADER_LEN || !bmp.starts_with(b"BM") {
        return Err(ImageError::Encode("BMP 编码输出缺少文件头".to_string()));
    }

    bmp.drain(..BITMAP_FILE_HEADER_LEN);
    Ok(bmp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_handler::hash_image;
    use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

    fn read_u32(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes([
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ])
    }

    fn read_i32(bytes: &[u8], offset: usize) -> i32 {
        read_u32(bytes, offset) as i32
    }

    #[test]
    fn dib_starts_with_info_header() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(5, 3, Rgb([1, 2, 3])));
        let dib = encode_dib(&image).unwrap();

        assert_eq!(read_u32(&dib, 0), 40, "biSize");
        assert_eq!(read_i32(&dib, 4), 5, "biWidth");
        assert_eq!(read_i32(&dib, 8).abs(), 3, "biHeight");
        assert_eq!(u16::from_le_bytes([dib[14], dib[15]]), 24, "biBitCount");
        assert!(!dib.starts_with(b"BM"));
    }

    #[test]
    fn rgba_input_is_flattened_to_24_bit() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([9, 9, 9, 128])));
        let dib = encode_dib(&image).unwrap();
        assert_eq!(read_u32(&dib, 0), 40);
        assert_eq!(u16::from_le_bytes([dib[14], dib[15]]), 24);
    }

    /// 补回文件头后按 BMP 解码，模拟从剪贴板读回 `CF_DIB`。
    fn decode_dib(dib: &[u8]) -> DynamicImage {
        let pixel_offset = (BITMAP_FILE_HEADER_LEN + read_u32(dib, 0) as usize) as u32;
        let file_len = (BITMAP_FILE_HEADER_LEN + dib.len()) as u32;

        let mut bmp = Vec::with_capacity(file_len as usize);
        bmp.extend_from_slice(b"BM");
        bmp.extend_from_slice(&file_len.to_le_bytes());
        bmp.extend_from_slice(&[0; 4]);
        bmp.extend_from_slice(&pixel_offset.to_le_bytes());
        bmp.extend_from_slice(dib);
        image::load_from_memory_with_format(&bmp, ImageFormat::Bmp).unwrap()
    }

    #[test]
    fn translucent_image_reads_back_as_its_flattened_form() {
        let mut img = RgbaImage::from_pixel(7, 5, Rgba([255, 255, 255, 128]));
        img.put_pixel(3, 2, Rgba([0, 0, 0, 200]));
        let image = DynamicImage::ImageRgba8(img);

        let read_back = decode_dib(&encode_dib(&image).unwrap());

        assert_eq!(hash_image(&read_back), hash_image(&flatten_alpha(&image)));
        assert_ne!(hash_image(&read_back), hash_image(&image));
    }

    #[test]
    fn empty_image_is_rejected() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(0, 4));
        assert!(matches!(encode_dib(&image), Err(ImageError::Encode(_))));
    }
}
