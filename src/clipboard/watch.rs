//! # 监听状态机模块
//!
//! ## 设计思路
//!
//! 每次剪贴板变化通知都同步走完一遍：
//!
//! ```text
//! 通知 ─┬─ suppress_next ? ──▶ 清除标志，忽略（自身写入的回声）
//!       └─ 处理中
//!            ├─ 有文本        ──▶ 跳过（文本优先）
//!            ├─ 无图片        ──▶ 跳过
//!            ├─ 哈希 == last  ──▶ 跳过（重复通知）
//!            └─ 裁剪 → 写入 → last_hash = hash(写入后的表示) → suppress_next = true
//! ```
//!
//! 状态 `WatchState` 只由事件线程通过 `&mut` 修改，不需要锁。
//! 处理中的任何错误只记录警告，不改动 `last_hash` / `suppress_next`。
//!
//! ## 忽略标志的加固
//!
//! 单纯的一次性标志假设“一次写入恰好产生一次通知”。这里额外做了两点：
//! - 标志在 `suppress_window` 之后失效，迟到很久的通知按外部变化处理；
//! - 回声即使没被标志吃掉，也会因 `last_hash` 等于刚写入图片的哈希而被跳过。

use std::time::{Duration, Instant};

use image::DynamicImage;

use super::gateway::ClipboardGateway;
use crate::config::AppConfig;
use crate::error::AppError;
use crate::image_handler::{crop_borders, hash_image, ContentHash, CropOutcome};

/// 监听循环的可变状态。
#[derive(Debug, Default)]
pub struct WatchState {
    last_hash: Option<ContentHash>,
    suppress_next: bool,
    written_at: Option<Instant>,
}

impl WatchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 最近一次产出或见过的图片摘要。
    pub fn last_hash(&self) -> Option<&ContentHash> {
        self.last_hash.as_ref()
    }

    /// 下一次通知是否会被当作回声忽略。
    pub fn is_suppressing(&self) -> bool {
        self.suppress_next
    }

    fn record_write(&mut self, hash: ContentHash, now: Instant) {
        self.last_hash = Some(hash);
        self.suppress_next = true;
        self.written_at = Some(now);
    }

    /// 消费忽略标志，返回本次通知是否应被忽略。
    fn take_suppression(&mut self, now: Instant, window: Duration) -> bool {
        if !self.suppress_next {
            return false;
        }
        self.suppress_next = false;

        match self.written_at {
            Some(written_at) if now.saturating_duration_since(written_at) > window => {
                log::debug!(
                    "⌛ 忽略标志已过期（{}ms > {}ms），按外部变化处理",
                    now.saturating_duration_since(written_at).as_millis(),
                    window.as_millis()
                );
                false
            }
            _ => true,
        }
    }
}

/// 监听循环参数。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    pub margin: u32,
    pub suppress_window: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        WatchOptions::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for WatchOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            margin: config.margin,
            suppress_window: config.suppress_window(),
        }
    }
}

/// 单次通知的处理结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOutcome {
    /// 自身写入的回声，已忽略。
    SuppressedEcho,
    /// 剪贴板中有文本，跳过。
    TextSkipped,
    /// 没有可解码的图片。
    NoImage,
    /// 与上次处理的图片相同。
    Duplicate,
    /// 整张图都是背景色，未写入。
    NoForeground,
    /// 已裁剪并写回剪贴板。
    Updated {
        from: (u32, u32),
        to: (u32, u32),
    },
    /// 处理出错，已记录日志。
    Failed,
}

/// 处理一次剪贴板变化通知。
pub fn handle_clipboard_change<G: ClipboardGateway>(
    state: &mut WatchState,
    gateway: &mut G,
    options: &WatchOptions,
    now: Instant,
) -> ChangeOutcome {
    if state.take_suppression(now, options.suppress_window) {
        log::debug!("⏭️  忽略应用主动触发的剪贴板变化");
        return ChangeOutcome::SuppressedEcho;
    }

    match process_change(state, gateway, options, now) {
        Ok(outcome) => outcome,
        Err(err) if err.is_busy() => {
            log::warn!("⚠️ 剪贴板被其他程序占用，本次变化已丢弃: {}", err);
            ChangeOutcome::Failed
        }
        Err(err) => {
            log::warn!("⚠️ 处理剪贴板图片失败: {}", err);
            ChangeOutcome::Failed
        }
    }
}

fn process_change<G: ClipboardGateway>(
    state: &mut WatchState,
    gateway: &mut G,
    options: &WatchOptions,
    now: Instant,
) -> Result<ChangeOutcome, AppError> {
    if gateway.probe_text_available()? {
        log::info!("📝 剪贴板内容为文本，跳过");
        return Ok(ChangeOutcome::TextSkipped);
    }

    let Some(image) = gateway.read_image()? else {
        return Ok(ChangeOutcome::NoImage);
    };

    let hash = hash_image(&image);
    if state.last_hash.as_ref() == Some(&hash) {
        log::debug!("🔁 图片已处理过，跳过: {}", hash.short());
        return Ok(ChangeOutcome::Duplicate);
    }

    log::info!(
        "🖼️ 已读取剪贴板图片 - 尺寸: {}x{} 哈希: {}",
        image.width(),
        image.height(),
        hash.short()
    );

    let from = (image.width(), image.height());
    match crop_borders(&image, options.margin) {
        CropOutcome::NoForeground(_) => {
            // 原图写回与不写结果相同，只是多一次回声；记下哈希即可跳过同一张图
            log::warn!("⚠️ 未检测到对象，保留原图");
            state.last_hash = Some(hash);
            Ok(ChangeOutcome::NoForeground)
        }
        CropOutcome::Cropped { image: cropped, .. } => {
            write_cropped(state, gateway, &cropped, now)?;
            let to = (cropped.width(), cropped.height());
            log::info!(
                "✅ 剪贴板已更新 - {}x{} -> {}x{}",
                from.0,
                from.1,
                to.0,
                to.1
            );
            Ok(ChangeOutcome::Updated { from, to })
        }
    }
}

fn write_cropped<G: ClipboardGateway>(
    state: &mut WatchState,
    gateway: &mut G,
    cropped: &DynamicImage,
    now: Instant,
) -> Result<(), AppError> {
    // 按读回时的表示计算，回声才能命中 last_hash
    let cropped_hash = hash_image(&gateway.as_written(cropped));
    gateway.write_image(cropped)?;
    state.record_write(cropped_hash, now);
    Ok(())
}

/// 持有状态、网关与参数的监听器，供事件源逐条投递通知。
pub struct ImageWatcher<G> {
    state: WatchState,
    gateway: G,
    options: WatchOptions,
}

impl<G: ClipboardGateway> ImageWatcher<G> {
    pub fn new(gateway: G, options: WatchOptions) -> Self {
        Self {
            state: WatchState::new(),
            gateway,
            options,
        }
    }

    /// 以当前时间处理一次通知。
    pub fn on_change(&mut self) -> ChangeOutcome {
        self.on_change_at(Instant::now())
    }

    pub fn on_change_at(&mut self, now: Instant) -> ChangeOutcome {
        handle_clipboard_change(&mut self.state, &mut self.gateway, &self.options, now)
    }

    pub fn state(&self) -> &WatchState {
        &self.state
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn options(&self) -> &WatchOptions {
        &self.options
    }
}
