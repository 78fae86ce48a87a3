//! # 子命令实现
//!
//! 图像文件以只读内存映射打开，头部解析后交给扫描器与提取器。
//! 面向用户的输出和带上下文的错误都在这里生成。

use crate::bitmap::BitmapHeader;
use crate::cli::{InspectArgs, RecoverArgs};
use crate::grid::PixelGrid;
use crate::scanner::ScanConfig;
use crate::steganography::{locate, recover_message};
use anyhow::{Context, Result};
use colored::Colorize;
use memmap2::Mmap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

/// 以只读方式把图像文件映射到内存。
fn map_image(path: &Path) -> Result<Mmap> {
    let file = File::open(path).with_context(|| {
        format!(
            "Unable to read image file: {}",
            path.to_string_lossy().red().bold()
        )
    })?;
    // SAFETY: 映射期间本程序不会修改该文件
    unsafe { Mmap::map(&file) }.with_context(|| {
        format!(
            "Unable to map image file into memory: {}",
            path.to_string_lossy().red().bold()
        )
    })
}

fn open_grid<'a>(image: &'a [u8], path: &Path) -> Result<(BitmapHeader, PixelGrid<'a>)> {
    let header = BitmapHeader::parse(image).with_context(|| {
        format!(
            "'{}' is not a readable bitmap.",
            path.to_string_lossy().red().bold()
        )
    })?;
    let grid = header
        .pixel_data(image)
        .and_then(|pixels| PixelGrid::new(pixels, header.geometry()))
        .with_context(|| {
            format!(
                "The pixel data of '{}' does not match its declared geometry ({}x{}, {} bpp).",
                path.to_string_lossy().red().bold(),
                header.width,
                header.height,
                header.bits_per_pixel
            )
        })?;
    Ok((header, grid))
}

fn describe(config: &ScanConfig) -> String {
    format!(
        "{:?} scan ({} workers, cancel on resolve: {})",
        config.strategy, config.workers, config.cancel_on_resolve
    )
}

/// 处理 'Recover' 命令的执行逻辑。
///
/// 负责映射图像文件、定位标题行并提取消息，最后把消息原样写到标准输出，
/// 或在指定了 `--text` 时写入目标文件。
///
/// # Arguments
///
/// * `args` - 包含输入/输出路径与扫描参数的 `RecoverArgs` 结构体。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 无法读取或映射输入的图像文件。
/// * 头部被截断，或像素数据短于声明的几何信息。
/// * 图像中没有标题行，或提取窗口无法容纳声明的长度。
/// * 目标文件已存在且没有指定 `--force`。
/// * 无法写入标准输出或目标文件。
pub fn handle_recover(args: RecoverArgs) -> Result<()> {
    if let Some(text) = &args.text {
        anyhow::ensure!(
            args.force || !text.exists(),
            "Output file already exists: {}. \nUse --force to overwrite it.",
            text.to_string_lossy().red().bold()
        );
    }

    let image = map_image(&args.image)?;
    let (_, grid) = open_grid(&image, &args.image)?;

    let config = args.scan.to_config();
    log::info!("recovering message with {}", describe(&config));

    let message = recover_message(&grid, &config).with_context(|| {
        format!(
            "Failed to recover the hidden message from '{}'. \nThe image may not contain a hidden message or is corrupted.",
            args.image.to_string_lossy().red().bold()
        )
    })?;
    log::info!("recovered {} bytes", message.len());

    match &args.text {
        Some(text) => {
            fs::write(text, &message).with_context(|| {
                format!(
                    "Unable to write to target text file: {}",
                    text.to_string_lossy().red().bold()
                )
            })?;
            println!(
                "The message has been successfully recovered and saved: {}",
                text.to_string_lossy().green().bold()
            );
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(&message)
                .and_then(|()| stdout.flush())
                .context("Unable to write the message to standard output")?;
        }
    }

    Ok(())
}

/// 处理 'Inspect' 命令的执行逻辑，把报告打印到标准输出。
///
/// # Errors
///
/// 同 [`write_inspect_report`]，另外写入标准输出失败时也返回错误。
pub fn handle_inspect(args: InspectArgs) -> Result<()> {
    let mut stdout = io::stdout().lock();
    write_inspect_report(&args, &mut stdout)?;
    stdout
        .flush()
        .context("Unable to write the report to standard output")
}

/// 生成 inspect 报告：头部字段、行跨度以及标题行的检测结果，不提取消息。
///
/// 检测结果包括两个哨兵的位置、长度像素的位置、声明的长度与提取窗口。
///
/// # Errors
///
/// 无法读取图像、头部被截断、像素数据不足、并行扫描线程出错或写入 `out`
/// 失败时返回错误。没有找到标题行不算错误。
pub fn write_inspect_report<W: Write>(args: &InspectArgs, out: &mut W) -> Result<()> {
    let image = map_image(&args.image)?;
    let (header, grid) = open_grid(&image, &args.image)?;

    writeln!(
        out,
        "{} {}",
        "Image:".bold(),
        args.image.to_string_lossy().green().bold()
    )?;
    writeln!(
        out,
        "  signature: {}, file size: {}, pixel data offset: {}",
        String::from_utf8_lossy(&header.signature),
        header.file_size,
        header.pixel_data_offset
    )?;
    writeln!(
        out,
        "  {}x{}, {} bpp, {} planes, compression {}, row stride {} bytes",
        header.width,
        header.height,
        header.bits_per_pixel,
        header.planes,
        header.compression,
        grid.row_stride()
    )?;

    let config = args.scan.to_config();
    writeln!(out, "{} {}", "Detection:".bold(), describe(&config))?;

    let resolution = locate(&grid, &config).with_context(|| {
        format!(
            "Failed to scan '{}' for a header line.",
            args.image.to_string_lossy().red().bold()
        )
    })?;

    match resolution {
        Some(resolution) => {
            let (closing_row, closing_col) = resolution.closing_marker;
            writeln!(
                out,
                "  header markers at columns {} and {} (closing marker on row {})",
                resolution.first_marker_col, closing_col, closing_row
            )?;
            writeln!(
                out,
                "  length pixel at row {}, column {}",
                resolution.length_row, resolution.length_col
            )?;
            writeln!(
                out,
                "  message length: {}",
                resolution.message_len.to_string().green().bold()
            )?;
            writeln!(
                out,
                "  extraction window: rows {} and upward, columns {}..={}",
                resolution.start_row, resolution.start_col, resolution.end_col
            )?;
        }
        None => writeln!(out, "  {}", "no header line found".red().bold())?,
    }

    Ok(())
}
