//! # 边框裁剪模块
//!
//! ## 设计思路
//!
//! 纯算法模块，不触碰剪贴板与文件系统：输入一张图片与边距，输出裁剪后的图片。
//!
//! ## 实现思路
//!
//! 1. 取四个角的像素，出现次数最多者为背景色（平票按 左上→右上→左下→右下 取先出现者）
//! 2. 与背景色逐像素求差，换算为单通道亮度差，`> 10` 视为前景，得到前景掩码
//! 3. 求掩码中所有前景像素的最小外接矩形
//! 4. 四边各外扩 `margin` 像素
//! 5. 与画布求交后裁剪；若外扩越界，则用背景色补足越界部分，保证边距始终可见
//!
//! 全程整数像素坐标，不做亚像素插值；像素格式与输入保持一致。

use image::imageops;
use image::{DynamicImage, GrayImage, ImageBuffer, Luma, Pixel, Rgb};

/// 亮度差阈值（0–255），严格大于该值的像素视为前景。
pub const FOREGROUND_THRESHOLD: u8 = 10;

const MASK_ON: u8 = 255;
const MASK_OFF: u8 = 0;

/// 前景外接矩形，右/下边界为开区间。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl BoundingBox {
    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }

    fn include(self, x: u32, y: u32) -> Self {
        Self {
            left: self.left.min(x),
            top: self.top.min(y),
            right: self.right.max(x + 1),
            bottom: self.bottom.max(y + 1),
        }
    }
}

/// 外扩后超出原画布的像素数（各边独立计算）。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Shortfall {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl Shortfall {
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

/// 一次裁剪的执行计划：画布内的实际裁剪区域 + 需要合成的背景补边。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropPlan {
    pub region: BoundingBox,
    pub padding: Shortfall,
}

impl CropPlan {
    /// 将外接矩形按 `margin` 外扩，并与 `width x height` 画布求交。
    pub fn new(bbox: BoundingBox, margin: u32, width: u32, height: u32) -> Self {
        let margin = i64::from(margin);
        let (width, height) = (i64::from(width), i64::from(height));

        let left = i64::from(bbox.left) - margin;
        let top = i64::from(bbox.top) - margin;
        let right = i64::from(bbox.right) + margin;
        let bottom = i64::from(bbox.bottom) + margin;

        let to_u32 = |v: i64| u32::try_from(v.max(0)).unwrap_or(u32::MAX);

        Self {
            region: BoundingBox {
                left: to_u32(left),
                top: to_u32(top),
                right: to_u32(right.min(width)),
                bottom: to_u32(bottom.min(height)),
            },
            padding: Shortfall {
                left: to_u32(-left),
                top: to_u32(-top),
                right: to_u32(right - width),
                bottom: to_u32(bottom - height),
            },
        }
    }

    /// 补边后的最终输出尺寸。
    pub fn output_dimensions(&self) -> (u32, u32) {
        (
            self.region
                .width()
                .saturating_add(self.padding.left)
                .saturating_add(self.padding.right),
            self.region
                .height()
                .saturating_add(self.padding.top)
                .saturating_add(self.padding.bottom),
        )
    }
}

/// 裁剪结果。
#[derive(Debug, Clone)]
pub enum CropOutcome {
    /// 检测到前景，`image` 为裁剪（必要时补边）后的图片。
    Cropped {
        image: DynamicImage,
        bbox: BoundingBox,
    },
    /// 整张图都是背景色，原图原样返回。
    NoForeground(DynamicImage),
}

impl CropOutcome {
    pub fn image(&self) -> &DynamicImage {
        match self {
            Self::Cropped { image, .. } => image,
            Self::NoForeground(image) => image,
        }
    }

    pub fn into_image(self) -> DynamicImage {
        match self {
            Self::Cropped { image, .. } => image,
            Self::NoForeground(image) => image,
        }
    }

    pub fn is_cropped(&self) -> bool {
        matches!(self, Self::Cropped { .. })
    }
}

/// 裁掉纯色边框，保留 `margin` 像素的背景。
///
/// 8 位 RGB / RGBA / 灰度 / 灰度+Alpha 原格式处理；其余格式先转为 RGBA8。
///
/// # 示例
/// ```rust
/// use clipboard_border_cropper::image_handler::crop_borders;
/// use image::{DynamicImage, Rgb, RgbImage};
///
/// let mut canvas = RgbImage::from_pixel(50, 50, Rgb([255, 255, 255]));
/// canvas.put_pixel(25, 25, Rgb([0, 0, 0]));
/// let outcome = crop_borders(&DynamicImage::ImageRgb8(canvas), 2);
/// assert_eq!(outcome.image().width(), 5);
/// ```
pub fn crop_borders(image: &DynamicImage, margin: u32) -> CropOutcome {
    let cropped = match image {
        DynamicImage::ImageRgba8(buf) => {
            crop_buffer(buf, margin).map(|(b, bbox)| (DynamicImage::ImageRgba8(b), bbox))
        }
        DynamicImage::ImageRgb8(buf) => {
            crop_buffer(buf, margin).map(|(b, bbox)| (DynamicImage::ImageRgb8(b), bbox))
        }
        DynamicImage::ImageLuma8(buf) => {
            crop_buffer(buf, margin).map(|(b, bbox)| (DynamicImage::ImageLuma8(b), bbox))
        }
        DynamicImage::ImageLumaA8(buf) => {
            crop_buffer(buf, margin).map(|(b, bbox)| (DynamicImage::ImageLumaA8(b), bbox))
        }
        other => crop_buffer(&other.to_rgba8(), margin)
            .map(|(b, bbox)| (DynamicImage::ImageRgba8(b), bbox)),
    };

    match cropped {
        Some((image, bbox)) => CropOutcome::Cropped { image, bbox },
        None => CropOutcome::NoForeground(image.clone()),
    }
}

fn crop_buffer<P>(
    image: &ImageBuffer<P, Vec<u8>>,
    margin: u32,
) -> Option<(ImageBuffer<P, Vec<u8>>, BoundingBox)>
where
    P: Pixel<Subpixel = u8> + PartialEq + 'static,
{
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return None;
    }

    let background = estimate_background(image);
    let mask = foreground_mask(image, &background);
    let bbox = mask_bounding_box(&mask)?;
    let plan = CropPlan::new(bbox, margin, width, height);

    let region = plan.region;
    let cropped =
        imageops::crop_imm(image, region.left, region.top, region.width(), region.height())
            .to_image();

    if plan.padding.is_zero() {
        return Some((cropped, bbox));
    }

    let (out_width, out_height) = plan.output_dimensions();
    let mut canvas = ImageBuffer::from_pixel(out_width, out_height, background);
    imageops::replace(
        &mut canvas,
        &cropped,
        i64::from(plan.padding.left),
        i64::from(plan.padding.top),
    );
    Some((canvas, bbox))
}

/// 估算背景色：四角像素中出现次数最多者。
///
/// 调用方保证图片非空。
pub fn estimate_background<P>(image: &ImageBuffer<P, Vec<u8>>) -> P
where
    P: Pixel<Subpixel = u8> + PartialEq,
{
    let (width, height) = image.dimensions();
    let (right, bottom) = (width - 1, height - 1);
    let corners = [
        *image.get_pixel(0, 0),
        *image.get_pixel(right, 0),
        *image.get_pixel(0, bottom),
        *image.get_pixel(right, bottom),
    ];

    let mut best = corners[0];
    let mut best_count = 0;
    for candidate in &corners {
        let count = corners.iter().filter(|c| *c == candidate).count();
        if count > best_count {
            best = *candidate;
            best_count = count;
        }
    }
    best
}

/// 生成前景掩码：前景为 255，背景为 0。
pub fn foreground_mask<P>(image: &ImageBuffer<P, Vec<u8>>, background: &P) -> GrayImage
where
    P: Pixel<Subpixel = u8>,
{
    let background = background.to_rgb();
    let (width, height) = image.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let diff = luminance_difference(image.get_pixel(x, y).to_rgb(), background);
        if diff > FOREGROUND_THRESHOLD {
            Luma([MASK_ON])
        } else {
            Luma([MASK_OFF])
        }
    })
}

/// 掩码中所有前景像素的最小外接矩形；无前景时返回 `None`。
pub fn mask_bounding_box(mask: &GrayImage) -> Option<BoundingBox> {
    mask.enumerate_pixels()
        .filter(|(_, _, px)| px.0[0] != MASK_OFF)
        .fold(None, |bbox: Option<BoundingBox>, (x, y, _)| {
            Some(match bbox {
                Some(b) => b.include(x, y),
                None => BoundingBox {
                    left: x,
                    top: y,
                    right: x + 1,
                    bottom: y + 1,
                },
            })
        })
}

/// 逐通道绝对差，再按 ITU-R 601-2 定点公式换算为亮度（忽略 Alpha）。
fn luminance_difference(a: Rgb<u8>, b: Rgb<u8>) -> u8 {
    let [r, g, bl] = [0, 1, 2].map(|i| u32::from(a.0[i].abs_diff(b.0[i])));
    let luma = (r * 19_595 + g * 38_470 + bl * 7_471 + 0x8000) >> 16;
    luma.min(255) as u8
}
