use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

use dxfmerge_config::MergeConfig;
use dxfmerge_engine::layers::{ColorCycling, LayerMode};
use dxfmerge_engine::merge::{merge_files, MergeOptions};
use dxfmerge_io::sink::{DrawingSaver, DxfSink};

mod locator;

use locator::FileLocator;

/// 合并 OpenSCAD 导出的 DXF 文件：把连续的 LINE 记录拼成多段线，
/// 按源文件组织成图层后写出单个 DXF。
#[derive(Debug, Parser)]
#[command(name = "dxfmerge", version, about)]
struct Cli {
    /// 输入文件或目录
    #[arg(
        short,
        long = "inputs",
        num_args = 1..,
        default_value = "./input",
        value_name = "path"
    )]
    inputs: Vec<PathBuf>,

    /// 输出文件
    #[arg(
        short,
        long,
        default_value = "./output/merged.dxf",
        value_name = "path"
    )]
    output: PathBuf,

    /// 检索文件的通配模式（默认 *.dxf）
    #[arg(long, num_args = 1.., value_name = "pattern")]
    search: Vec<String>,

    /// 忽略文件/目录的通配模式（默认 *_ignore_*）
    #[arg(long, num_args = 1.., value_name = "pattern")]
    ignore: Vec<String>,

    /// 图层使用的 ACI 颜色序列
    #[arg(long, num_args = 1.., value_name = "index")]
    colors: Vec<u8>,

    /// 所有文件合并进同一图层
    #[arg(long)]
    single_layer: bool,

    /// 每个文件轮转使用调色板中的下一个颜色
    #[arg(long)]
    cycle_colors: bool,

    /// 连续性判定的容差；缺省时按解析后的数值做精确比较
    #[arg(long, value_name = "distance")]
    tolerance: Option<f64>,

    /// 配置文件路径（缺省时自动发现）
    #[arg(long, value_name = "path")]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = load_configuration(cli.config.clone());
    init_logging(&config);

    // 输出目录必须在做任何实际工作之前就绪
    if let Some(parent) = cli.output.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            eprintln!("输出目录不存在: {}", parent.display());
            return ExitCode::FAILURE;
        }
    }

    let options = resolve_options(&cli, &config);

    let search = if cli.search.is_empty() {
        config.discovery.search.clone()
    } else {
        cli.search.clone()
    };
    let ignore = if cli.ignore.is_empty() {
        config.discovery.ignore.clone()
    } else {
        cli.ignore.clone()
    };

    let locator = match FileLocator::new(&search, &ignore) {
        Ok(locator) => locator,
        Err(err) => {
            error!(error = %err, "无法构建文件定位器");
            return ExitCode::FAILURE;
        }
    };
    let report = match locator.scan(&cli.inputs) {
        Ok(report) => report,
        Err(err) => {
            error!(error = %err, "文件发现失败");
            return ExitCode::FAILURE;
        }
    };
    info!(
        found = report.found.len(),
        ignored = report.ignored.len(),
        "文件发现完成"
    );

    let drawing = match merge_files(&report.found, &options) {
        Ok(drawing) => drawing,
        Err(err) => {
            error!(error = %err, "合并失败");
            return ExitCode::FAILURE;
        }
    };
    info!(
        layer_count = drawing.layer_count(),
        polyline_count = drawing.polyline_count(),
        "合并完成"
    );

    if let Err(err) = DxfSink::new().save(&drawing, &cli.output) {
        error!(error = %err, "写出失败");
        return ExitCode::FAILURE;
    }

    print_summary(&report.found, &report.ignored, &cli.output);
    ExitCode::SUCCESS
}

/// 此时日志订阅器尚未安装（日志等级本身来自配置），
/// 失败信息只能走标准错误输出。
fn load_configuration(override_path: Option<PathBuf>) -> MergeConfig {
    match override_path {
        Some(path) => MergeConfig::from_file(&path).unwrap_or_else(|err| {
            eprintln!("加载指定配置失败，使用默认配置: {err}");
            MergeConfig::default()
        }),
        None => match MergeConfig::discover() {
            Ok(cfg) => cfg,
            Err(err) => {
                eprintln!("加载默认配置失败，使用内建默认值: {err}");
                MergeConfig::default()
            }
        },
    }
}

fn init_logging(config: &MergeConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));
    fmt().with_env_filter(filter).with_target(false).init();
}

/// 把命令行与配置文件叠加成一次运行的不可变选项。命令行优先。
fn resolve_options(cli: &Cli, config: &MergeConfig) -> MergeOptions {
    let layer_mode = if cli.single_layer || config.layers.single_layer {
        LayerMode::Single
    } else {
        LayerMode::PerFile
    };
    let color_cycling = if cli.cycle_colors || config.layers.cycle_colors {
        ColorCycling::RoundRobin
    } else {
        ColorCycling::FirstOnly
    };
    let palette = if cli.colors.is_empty() {
        config.layers.palette.clone()
    } else {
        cli.colors.clone()
    };

    MergeOptions {
        layer_mode,
        color_cycling,
        palette,
        continuity_tolerance: cli.tolerance,
    }
}

fn print_summary(found: &[PathBuf], ignored: &[PathBuf], output: &std::path::Path) {
    println!("输入文件:");
    for path in found {
        println!("\t{}", path.display());
    }
    if !ignored.is_empty() {
        println!("忽略文件:");
        for path in ignored {
            println!("\t{}", path.display());
        }
    }
    println!("输出文件: {}", output.display());
}
