// 防止在 Windows 发布版本中显示额外的控制台窗口，不要删除！
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

//! # 剪贴板图片去边工具 — 应用入口
//!
//! 本文件仅负责参数解析、日志与配置初始化，以及选择运行模式：
//!
//! - 监听模式（默认）：`clipboard-border-cropper [--config <path>]`
//! - 文件模式：`clipboard-border-cropper crop <input> <output> [--margin <n>] [--config <path>]`
//!
//! 业务逻辑分布在各子模块中，详见 `lib.rs` 架构文档。

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use clipboard_border_cropper::clipboard::{
    run_listener, ImageWatcher, RestartBackoff, ShutdownHandle, SystemClipboard, WatchOptions,
};
use clipboard_border_cropper::config::AppConfig;
use clipboard_border_cropper::error::AppError;
use clipboard_border_cropper::image_handler;
use clipboard_border_cropper::signal::spawn_signal_watcher;

#[derive(Parser)]
#[command(name = "clipboard-border-cropper")]
#[command(about = "监听剪贴板，自动裁掉图片的纯色边框", long_about = None)]
struct Cli {
    /// 配置文件路径（默认读取可执行文件旁的 border-cropper.json）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// 监听剪贴板（默认）
    Watch,
    /// 裁剪单个图片文件
    Crop {
        /// 输入图片
        input: PathBuf,
        /// 输出图片（格式由扩展名决定）
        output: PathBuf,
        /// 覆盖配置中的边距
        #[arg(long)]
        margin: Option<u32>,
    },
}

fn run(command: Command, config: AppConfig) -> Result<(), AppError> {
    match command {
        Command::Crop {
            input,
            output,
            margin,
        } => {
            let margin = margin.unwrap_or(config.margin);
            image_handler::crop_file(&input, &output, margin, config.max_pixels)?;
            log::info!("💾 已写出: {}", output.display());
            Ok(())
        }
        Command::Watch => {
            let gateway = SystemClipboard::new(config.max_pixels)?;
            let mut watcher = ImageWatcher::new(gateway, WatchOptions::from(&config));
            let shutdown = ShutdownHandle::new();
            spawn_signal_watcher(shutdown.clone())?;
            run_listener(&mut watcher, &shutdown, RestartBackoff::from(&config))
        }
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::from(2)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    // 配置读取失败时先用默认级别初始化日志，保证错误可见
    let config = AppConfig::load(cli.config.as_deref());
    let log_level = config
        .as_ref()
        .map(|c| c.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = match config {
        Ok(config) => config,
        Err(err) => {
            log::error!("❌ {}", err);
            return ExitCode::FAILURE;
        }
    };
    log::info!("⚙️ 配置已加载: {:?}", config);

    match run(cli.command.unwrap_or(Command::Watch), config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("❌ 发生致命错误: {}", err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("clipboard-border-cropper").chain(args.iter().copied()))
    }

    #[test]
    fn no_arguments_means_watch_mode() {
        let cli = parse(&[]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());

        let cli = parse(&["watch", "--config", "c.json"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Watch)));
        assert_eq!(cli.config, Some(PathBuf::from("c.json")));
    }

    #[test]
    fn crop_command_with_margin_and_config() {
        let cli = parse(&["crop", "a.png", "b.png", "--margin", "4", "--config", "c.json"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("c.json")));
        match cli.command {
            Some(Command::Crop {
                input,
                output,
                margin,
            }) => {
                assert_eq!(input, PathBuf::from("a.png"));
                assert_eq!(output, PathBuf::from("b.png"));
                assert_eq!(margin, Some(4));
            }
            _ => panic!("expected crop command"),
        }
    }

    #[test]
    fn invalid_margin_is_rejected() {
        let err = parse(&["crop", "a.png", "b.png", "--margin", "-3"]).err().unwrap();
        assert!(err.use_stderr());
        assert!(parse(&["crop", "a.png", "b.png", "--margin"]).is_err());
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        let err = parse(&["resize", "a.png"]).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
        assert!(parse(&["crop", "a.png"]).is_err());
    }
}
