//! 无界面的标注回放工具.
//!
//! 加载一个 NIfTI 体数据, 把 JSON 脚本中录制的指针/滚轮事件依次喂给
//! [`nii_paint::Session`], 最后保存标签文件, 并可导出当前切片的 PNG 预览.

mod result;
mod runner;
mod script;

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

/// 命令行参数.
#[derive(Parser, Debug)]
#[command(author, version, about = "Replay recorded brush strokes on a NIfTI volume")]
pub struct Args {
    /// 体数据路径. 相对路径以数据目录为基准.
    pub volume: PathBuf,

    /// 笔画脚本 (JSON).
    pub script: PathBuf,

    /// 标签输出路径. 默认为体数据旁边的 `<名称>_labels.nii.gz`.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// 在该目录下导出回放结束时所在切片的 PNG 预览.
    #[arg(short, long)]
    pub preview: Option<PathBuf>,

    /// 日志详细程度, 可重复.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let level = match args.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    if let Err(e) = simple_logger::SimpleLogger::new().with_level(level).init() {
        eprintln!("Logger initialisation error: {e}");
    }

    match runner::run(&args) {
        Ok(result) => {
            result.analyze();
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
