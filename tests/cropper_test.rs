// Tests for border detection, margin expansion and edge padding
use clipboard_border_cropper::image_handler::{
    crop_borders, crop_file, hash_image, BoundingBox, CropOutcome,
};
use image::{DynamicImage, GenericImageView, LumaA, Rgb, RgbImage, Rgba, RgbaImage};
use proptest::prelude::*;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

fn canvas_with_rect(
    width: u32,
    height: u32,
    background: Rgba<u8>,
    rect: (u32, u32, u32, u32),
    foreground: Rgba<u8>,
) -> DynamicImage {
    let (left, top, right, bottom) = rect;
    let mut img = RgbaImage::from_pixel(width, height, background);
    for y in top..bottom {
        for x in left..right {
            img.put_pixel(x, y, foreground);
        }
    }
    DynamicImage::ImageRgba8(img)
}

fn assert_region_is(image: &DynamicImage, rect: (u32, u32, u32, u32), expected: Rgba<u8>) {
    let (left, top, right, bottom) = rect;
    for y in top..bottom {
        for x in left..right {
            assert_eq!(image.get_pixel(x, y), expected, "pixel ({}, {})", x, y);
        }
    }
}

#[test]
fn centered_square_gets_exact_margin() {
    let input = canvas_with_rect(200, 200, WHITE, (80, 80, 120, 120), BLACK);

    let outcome = crop_borders(&input, 10);
    let CropOutcome::Cropped { image, bbox } = outcome else {
        panic!("expected a crop");
    };

    assert_eq!(bbox, BoundingBox { left: 80, top: 80, right: 120, bottom: 120 });
    assert_eq!(image.dimensions(), (60, 60));
    assert_region_is(&image, (10, 10, 50, 50), BLACK);
    assert_region_is(&image, (0, 0, 60, 10), WHITE);
    assert_region_is(&image, (0, 50, 60, 60), WHITE);
    assert_region_is(&image, (0, 0, 10, 60), WHITE);
    assert_region_is(&image, (50, 0, 60, 60), WHITE);
}

#[test]
fn square_in_top_left_corner_is_padded_with_background() {
    // 前景触及左上角：上、左两侧的边距由背景色合成，右、下两侧取自原图
    // 输出为 20 + 2*10 = 40，按补边规则而非最初设想的 30x30（见 DESIGN.md 决策 3）
    let input = canvas_with_rect(100, 100, WHITE, (0, 0, 20, 20), BLACK);

    let image = crop_borders(&input, 10).into_image();

    assert_eq!(image.dimensions(), (40, 40));
    assert_region_is(&image, (10, 10, 30, 30), BLACK);
    assert_region_is(&image, (0, 0, 40, 10), WHITE);
    assert_region_is(&image, (0, 0, 10, 40), WHITE);
    assert_region_is(&image, (30, 0, 40, 40), WHITE);
    assert_region_is(&image, (0, 30, 40, 40), WHITE);
}

#[test]
fn square_in_bottom_right_corner_is_padded_with_background() {
    let input = canvas_with_rect(50, 40, WHITE, (45, 36, 50, 40), BLACK);

    let image = crop_borders(&input, 3).into_image();

    assert_eq!(image.dimensions(), (11, 10));
    assert_region_is(&image, (3, 3, 8, 7), BLACK);
    assert_region_is(&image, (8, 0, 11, 10), WHITE);
    assert_region_is(&image, (0, 7, 11, 10), WHITE);
}

#[test]
fn solid_image_is_returned_unchanged() {
    let input = DynamicImage::ImageRgba8(RgbaImage::from_pixel(64, 48, Rgba([12, 34, 56, 255])));

    let outcome = crop_borders(&input, 10);

    assert!(!outcome.is_cropped());
    assert_eq!(outcome.image(), &input);
    assert_eq!(hash_image(outcome.image()), hash_image(&input));
}

#[test]
fn dark_background_is_detected_from_corners() {
    let dark = Rgba([20, 20, 30, 255]);
    let light = Rgba([230, 230, 230, 255]);
    let input = canvas_with_rect(80, 60, dark, (30, 20, 50, 25), light);

    let image = crop_borders(&input, 2).into_image();

    assert_eq!(image.dimensions(), (24, 9));
    assert_eq!(image.get_pixel(0, 0), dark);
    assert_eq!(image.get_pixel(2, 2), light);
}

#[test]
fn content_touching_one_corner_does_not_fool_background_estimate() {
    // 左上角被前景覆盖，其余三个角仍为白色
    let input = canvas_with_rect(60, 60, WHITE, (0, 0, 5, 5), BLACK);

    let outcome = crop_borders(&input, 0);

    let CropOutcome::Cropped { bbox, .. } = outcome else {
        panic!("expected a crop");
    };
    assert_eq!(bbox, BoundingBox { left: 0, top: 0, right: 5, bottom: 5 });
}

#[test]
fn rgb_input_keeps_rgb_format() {
    let mut img = RgbImage::from_pixel(30, 30, Rgb([255, 255, 255]));
    img.put_pixel(15, 15, Rgb([200, 0, 0]));

    let image = crop_borders(&DynamicImage::ImageRgb8(img), 1).into_image();

    assert!(matches!(image, DynamicImage::ImageRgb8(_)));
    assert_eq!(image.dimensions(), (3, 3));
}

#[test]
fn luma_alpha_input_keeps_format_and_pads() {
    let mut img = image::ImageBuffer::from_pixel(10, 10, LumaA([255u8, 255]));
    img.put_pixel(0, 5, LumaA([0, 255]));

    let image = crop_borders(&DynamicImage::ImageLumaA8(img), 2).into_image();

    assert!(matches!(image, DynamicImage::ImageLumaA8(_)));
    assert_eq!(image.dimensions(), (5, 5));
}

#[test]
fn crop_file_writes_cropped_png() {
    let dir = tempfile::tempdir().unwrap();
    let input_path = dir.path().join("input.png");
    let output_path = dir.path().join("output.png");
    canvas_with_rect(120, 90, WHITE, (40, 30, 60, 40), BLACK)
        .save(&input_path)
        .unwrap();

    let outcome = crop_file(&input_path, &output_path, 5, u64::MAX).unwrap();

    assert!(outcome.is_cropped());
    let written = image::open(&output_path).unwrap();
    assert_eq!(written.dimensions(), (30, 20));
}

#[test]
fn crop_file_respects_pixel_limit() {
    let dir = tempfile::tempdir().unwrap();
    let input_path = dir.path().join("big.png");
    canvas_with_rect(100, 100, WHITE, (10, 10, 20, 20), BLACK)
        .save(&input_path)
        .unwrap();

    let result = crop_file(&input_path, &dir.path().join("out.png"), 5, 9_999);

    assert!(result.is_err());
    assert!(!dir.path().join("out.png").exists());
}

fn corners_covered(width: u32, height: u32, rect: (u32, u32, u32, u32)) -> usize {
    let (left, top, right, bottom) = rect;
    [(0, 0), (width - 1, 0), (0, height - 1), (width - 1, height - 1)]
        .iter()
        .filter(|(x, y)| *x >= left && *x < right && *y >= top && *y < bottom)
        .count()
}

fn rect_strategy() -> impl Strategy<Value = (u32, u32, (u32, u32, u32, u32))> {
    (8u32..60, 8u32..60).prop_flat_map(|(width, height)| {
        (0..width, 0..height).prop_flat_map(move |(left, top)| {
            (left + 1..=width, top + 1..=height)
                .prop_map(move |(right, bottom)| (width, height, (left, top, right, bottom)))
        })
    })
}

proptest! {
    #[test]
    fn output_is_box_plus_twice_margin(
        (width, height, rect) in rect_strategy(),
        margin in 0u32..12,
    ) {
        // 至多覆盖一个角时，四角多数仍为背景色
        prop_assume!(corners_covered(width, height, rect) <= 1);
        let input = canvas_with_rect(width, height, WHITE, rect, BLACK);

        let outcome = crop_borders(&input, margin);

        let CropOutcome::Cropped { image, bbox } = outcome else {
            return Err(TestCaseError::fail("expected a crop"));
        };
        prop_assert_eq!(bbox, BoundingBox { left: rect.0, top: rect.1, right: rect.2, bottom: rect.3 });
        prop_assert_eq!(image.width(), bbox.width() + 2 * margin);
        prop_assert_eq!(image.height(), bbox.height() + 2 * margin);
        for m in 0..margin {
            prop_assert_eq!(image.get_pixel(m, m), WHITE);
            prop_assert_eq!(image.get_pixel(image.width() - 1 - m, image.height() - 1 - m), WHITE);
        }
    }

    #[test]
    fn cropping_twice_is_a_no_op(
        left in 5u32..30,
        top in 5u32..30,
        w in 1u32..20,
        h in 1u32..20,
        margin in 1u32..5,
    ) {
        let rect = (left, top, left + w, top + h);
        let input = canvas_with_rect(left + w + 5, top + h + 5, WHITE, rect, BLACK);

        let once = crop_borders(&input, margin).into_image();
        let twice = crop_borders(&once, margin).into_image();

        prop_assert_eq!(once.dimensions(), (w + 2 * margin, h + 2 * margin));
        prop_assert_eq!(hash_image(&once), hash_image(&twice));
    }
}
