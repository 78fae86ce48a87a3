//! # 命令行参数
//!
//! `recover` 提取隐藏消息，`inspect` 只报告头部与标题行的位置。
//! 两者通过 `#[command(flatten)]` 共用 [`ScanArgs`] 中的扫描选项。

use clap::Parser;
use std::path::PathBuf;

use crate::constants::MAX_WORKERS;
use crate::scanner::{ScanConfig, ScanStrategy};

/// 从未压缩的 BMP 图像中找出由哨兵像素标记的隐藏消息并将其提取出来。
#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "从未压缩的 BMP 图像中找出由哨兵像素标记的隐藏消息并将其提取出来。"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令：recover (恢复) 和 inspect (检查)。
#[derive(Parser, Debug)]
pub enum Commands {
    /// 提取隐藏的消息，写到标准输出或指定文件。
    Recover(RecoverArgs),

    /// 打印头部字段与标题行的检测结果，不提取消息。
    Inspect(InspectArgs),
}

/// 扫描相关的参数，两个子命令共用。
#[derive(clap::Args, Debug, Clone, Copy, Default)]
pub struct ScanArgs {
    /// 扫描策略。
    #[arg(short, long, value_enum, default_value_t = ScanStrategy::Sequential)]
    pub strategy: ScanStrategy,

    /// 并行扫描的工作线程数 (1-8)，默认取主机的可用并行度。
    #[arg(
        short,
        long,
        env = "MARKER_DECODE_WORKERS",
        value_parser = clap::value_parser!(u8).range(1..=MAX_WORKERS as i64)
    )]
    pub workers: Option<u8>,

    /// 解析出消息长度后让其余工作线程在下一行开始前退出。
    #[arg(long)]
    pub cancel_on_resolve: bool,
}

impl ScanArgs {
    pub fn to_config(self) -> ScanConfig {
        let config = ScanConfig::default()
            .with_strategy(self.strategy)
            .with_cancel_on_resolve(self.cancel_on_resolve);
        match self.workers {
            Some(workers) => config.with_workers(usize::from(workers)),
            None => config,
        }
    }
}

/// 'recover' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct RecoverArgs {
    /// 含有隐藏消息的 BMP 图像文件路径。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 保存消息的文件路径；省略时写到标准输出。
    #[arg(short, long)]
    pub text: Option<PathBuf>,

    /// 目标文件已存在时强制覆盖。
    #[arg(short, long)]
    pub force: bool,

    #[command(flatten)]
    pub scan: ScanArgs,
}

/// 'inspect' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// 要检查的 BMP 图像文件路径。
    #[arg(short, long)]
    pub image: PathBuf,

    #[command(flatten)]
    pub scan: ScanArgs,
}
