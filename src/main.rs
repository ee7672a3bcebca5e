// ==========================================
// 租屋管理系统 - 命令行入口
// ==========================================
// 用法:
//   rental-billing calc --year 2025 --from 3 --to 4 \
//       --bills bills.csv --readings readings.xlsx \
//       [--db path] [--notes 备注] [--dry-run]
// ==========================================

use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use rental_billing::api::ApiError;
use rental_billing::app::{get_default_db_path, AppState};
use rental_billing::importer::ElectricityImporter;
use rental_billing::{AllocationOutcome, APP_NAME, VERSION};

#[derive(Parser, Debug)]
#[command(name = "rental-billing")]
#[command(version)]
#[command(about = "租屋管理系统 - 公共电费分摊", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 导入台电单据与抄表，计算并保存（或试算）电费分摊
    Calc(CalcArgs),
}

/// calc 子命令参数
#[derive(clap::Args, Debug)]
struct CalcArgs {
    /// 计费年度
    #[arg(long)]
    year: i32,

    /// 起始月份 (1-12)
    #[arg(long = "from", value_name = "MONTH")]
    month_start: u32,

    /// 结束月份 (1-12)
    #[arg(long = "to", value_name = "MONTH")]
    month_end: u32,

    /// 台电单据文件 (CSV / Excel)
    #[arg(long, value_name = "FILE")]
    bills: String,

    /// 抄表文件 (CSV / Excel)
    #[arg(long, value_name = "FILE")]
    readings: String,

    /// 数据库路径（默认取 RENTAL_BILLING_DB_PATH 或系统数据目录）
    #[arg(long, value_name = "PATH")]
    db: Option<String>,

    /// 计算备注
    #[arg(long)]
    notes: Option<String>,

    /// 只试算，不写入数据库
    #[arg(long)]
    dry_run: bool,
}

fn print_outcome(outcome: &AllocationOutcome) {
    println!(
        "单价: {:.4} 元/度  公用电: {:.2} 度  每间分摊: {:.0} 度",
        outcome.unit_price, outcome.public_kwh, outcome.public_per_room
    );
    println!(
        "{:<6} {:<10} {:>10} {:>10} {:>10} {:>8}",
        "房号", "类别", "房间度数", "公用度数", "总度数", "电费"
    );
    for r in &outcome.results {
        println!(
            "{:<6} {:<10} {:>10.2} {:>10.2} {:>10.2} {:>8}",
            r.room, r.kind.to_string(), r.private_kwh, r.public_kwh, r.total_kwh, r.fee
        );
    }
    println!("合计应收: {} 元", outcome.total_fee());
}

fn run_calc(args: CalcArgs) -> Result<()> {
    let importer = ElectricityImporter::new();
    let bills = importer
        .import_master_bills(&args.bills)
        .with_context(|| format!("读取台电单据失败: {}", args.bills))?;
    let readings = importer
        .import_meter_readings(&args.readings)
        .with_context(|| format!("读取抄表失败: {}", args.readings))?;

    let db_path = args.db.clone().unwrap_or_else(get_default_db_path);
    let state = AppState::new(db_path).map_err(|e| anyhow!(e))?;
    let api = &state.electricity_api;

    let outcome = if args.dry_run {
        api.preview(&bills, &readings)?
    } else {
        let period_id = api.create_period(args.year, args.month_start, args.month_end)?;
        api.calculate_and_save(period_id, &bills, &readings, args.notes.as_deref())?
    };

    print_outcome(&outcome);
    if args.dry_run {
        println!("(试算模式，未写入数据库)");
    }
    Ok(())
}

fn main() -> ExitCode {
    rental_billing::logging::init();
    rental_billing::i18n::init_from_env();
    tracing::debug!("{} v{}", APP_NAME, VERSION);

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Calc(args) => run_calc(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // 业务错误输出本地化提示与错误代码
            match err.downcast_ref::<ApiError>() {
                Some(api_err) => eprintln!("[{}] {}", api_err.code(), api_err.user_message()),
                None => eprintln!("错误: {:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}
