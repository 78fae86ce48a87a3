use clap::Parser;

use marker_decode::{
    cli::{Cli, Commands},
    handler::{handle_inspect, handle_recover},
};

/// 程序的主入口点
///
/// 负责初始化日志、解析命令行参数，并根据指定的子命令（`recover` 或 `inspect`）
/// 将执行分派到相应的处理函数
fn main() -> anyhow::Result<()> {
    // 日志写到标准错误，不会混入写到标准输出的消息
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // 解析命令行参数
    let cli = Cli::parse();

    // 根据子命令调用相应的处理函数
    match cli.command {
        Commands::Recover(args) => handle_recover(args),
        Commands::Inspect(args) => handle_inspect(args),
    }
}
