//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有“可调策略”集中到 `AppConfig`，启动时读取一次。
//! 文件格式为 JSON（camelCase 键），缺省字段回落到默认值，
//! 越界数值在 `normalize` 中夹回合法区间，而不是让进程拒绝启动。
//!
//! ## 查找顺序
//!
//! 1. 命令行显式给出的路径（文件必须存在）
//! 2. 可执行文件同目录下的 `border-cropper.json`（不存在则使用默认值）

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// 默认配置文件名。
pub const CONFIG_FILE_NAME: &str = "border-cropper.json";

const MARGIN_DEFAULT: u32 = 10;
const MARGIN_MAX: u32 = 1_000;
const SUPPRESS_WINDOW_DEFAULT_MS: u64 = 1_500;
const SUPPRESS_WINDOW_MIN_MS: u64 = 100;
const SUPPRESS_WINDOW_MAX_MS: u64 = 60_000;
const MAX_PIXELS_DEFAULT: u64 = 40_000_000;
const MAX_PIXELS_MIN: u64 = 1;
const RESTART_BASE_DEFAULT_MS: u64 = 100;
const RESTART_BASE_MIN_MS: u64 = 10;
const RESTART_MAX_DEFAULT_MS: u64 = 5_000;
const RESTART_MAX_LIMIT_MS: u64 = 300_000;

/// 应用配置。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    /// 前景四周保留的背景像素数。
    pub margin: u32,
    /// 自身写入后，忽略标志的有效期（毫秒）。
    pub suppress_window_ms: u64,
    /// 允许处理的最大像素数（`width * height`）。
    pub max_pixels: u64,
    /// 默认日志级别，`RUST_LOG` 优先。
    pub log_level: String,
    /// 监听意外退出后首次重启前的等待（毫秒），之后逐次翻倍。
    pub restart_base_delay_ms: u64,
    /// 重启等待的上限（毫秒）。
    pub restart_max_delay_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            margin: MARGIN_DEFAULT,
            suppress_window_ms: SUPPRESS_WINDOW_DEFAULT_MS,
            max_pixels: MAX_PIXELS_DEFAULT,
            log_level: "info".to_string(),
            restart_base_delay_ms: RESTART_BASE_DEFAULT_MS,
            restart_max_delay_ms: RESTART_MAX_DEFAULT_MS,
        }
    }
}

impl AppConfig {
    /// 从 JSON 文本解析并归一化。
    pub fn from_json(content: &str) -> Result<Self, AppError> {
        let parsed: Self = serde_json::from_str(content)
            .map_err(|e| AppError::Config(format!("解析配置文件失败: {}", e)))?;
        Ok(parsed.normalize())
    }

    /// 读取配置文件。
    ///
    /// `explicit` 为 `Some` 时文件必须存在；否则查找可执行文件旁的默认文件，
    /// 找不到即使用默认配置。
    pub fn load(explicit: Option<&Path>) -> Result<Self, AppError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let content = fs::read_to_string(&path)
            .map_err(|e| AppError::Config(format!("读取 {} 失败: {}", path.display(), e)))?;
        Self::from_json(&content)
    }

    /// 将越界数值夹回合法区间。
    pub fn normalize(mut self) -> Self {
        self.margin = self.margin.min(MARGIN_MAX);
        self.suppress_window_ms = self
            .suppress_window_ms
            .clamp(SUPPRESS_WINDOW_MIN_MS, SUPPRESS_WINDOW_MAX_MS);
        self.max_pixels = self.max_pixels.max(MAX_PIXELS_MIN);
        self.restart_max_delay_ms = self.restart_max_delay_ms.min(RESTART_MAX_LIMIT_MS);
        self.restart_base_delay_ms = self
            .restart_base_delay_ms
            .clamp(RESTART_BASE_MIN_MS, self.restart_max_delay_ms.max(RESTART_BASE_MIN_MS));
        self.restart_max_delay_ms = self.restart_max_delay_ms.max(self.restart_base_delay_ms);
        if self.log_level.trim().is_empty() {
            self.log_level = "info".to_string();
        }
        self
    }

    pub fn suppress_window(&self) -> Duration {
        Duration::from_millis(self.suppress_window_ms)
    }
}

fn default_config_path() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    Some(exe.parent()?.join(CONFIG_FILE_NAME))
}
