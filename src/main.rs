// ==========================================
// 特殊定尺钢筋采购优化系统 - CLI 主入口
// ==========================================
// 技术栈: Rust + SQLite + Tokio
// 系统定位: 采购决策支持系统
// ==========================================

use chrono::{Local, NaiveDate};
use rebar_aps::app::{get_default_db_path, AppState};
use rebar_aps::domain::types::Objective;
use std::path::Path;
use std::process::ExitCode;
use std::str::FromStr;

fn print_usage() {
    eprintln!("特殊定尺钢筋采购优化系统 v{}", rebar_aps::VERSION);
    eprintln!();
    eprintln!("用法:");
    eprintln!("  rebar-aps import-catalog <厂商文件> <定尺目录文件>");
    eprintln!("  rebar-aps import-marks <工程ID> <配筋表文件>");
    eprintln!("  rebar-aps optimize <工程ID> [目标 RCW|CO2|COST] [基准日 YYYY-MM-DD]");
    eprintln!("  rebar-aps export <修订ID> <切割清单.csv> <订单清单.csv>");
    eprintln!("  rebar-aps revisions <工程ID>");
    eprintln!();
    eprintln!("环境变量:");
    eprintln!("  REBAR_APS_DB_PATH  数据库文件路径 (默认: 用户数据目录)");
    eprintln!("  RUST_LOG           日志级别 (例如 rebar_aps=debug)");
}

#[tokio::main]
async fn main() -> ExitCode {
    rebar_aps::logging::init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("执行失败: {}", e);
            eprintln!("错误: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    let Some(command) = args.get(1) else {
        print_usage();
        return Err("缺少子命令".into());
    };

    let db_path = get_default_db_path();
    tracing::info!(db_path = %db_path, "使用数据库");
    let state = AppState::new(db_path)?;

    match command.as_str() {
        "import-catalog" => {
            let [manufacturers, stock_lengths] = expect_args::<2>(&args)?;
            let summary = rebar_aps::importer::CatalogImportSource::import_catalog(
                state.catalog_importer.as_ref(),
                Path::new(&manufacturers),
                Path::new(&stock_lengths),
            )
            .await?;
            println!(
                "目录导入完成: 厂商 {} 家, 定尺 {} 条, 跳过 {} 行",
                summary.manufacturers_imported,
                summary.stock_lengths_imported,
                summary.rows_skipped
            );
        }

        "import-marks" => {
            let [project_id, file] = expect_args::<2>(&args)?;
            let summary = rebar_aps::importer::BarMarkImportSource::import_bar_marks(
                state.bar_mark_importer.as_ref(),
                &project_id,
                Path::new(&file),
            )
            .await?;
            println!(
                "配筋表导入完成: 符号 {} 个, 合计 {} 根",
                summary.marks_imported, summary.total_pieces
            );
        }

        "optimize" => {
            let [project_id] = expect_args::<1>(&args)?;
            let objective = match args.get(3) {
                Some(raw) => Some(Objective::from_str(raw)?),
                None => None,
            };
            let today = match args.get(4) {
                Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")?,
                None => Local::now().date_naive(),
            };

            let result = state
                .optimize_api
                .run_revision(&project_id, objective, today)
                .await?;
            print_revision_summary(&result);
        }

        "export" => {
            let [revision_id, cutting_path, order_path] = expect_args::<3>(&args)?;
            let rows = state
                .export_api
                .export_cutting_list(&revision_id, Path::new(&cutting_path))?;
            println!("切割清单已导出: {} 行 -> {}", rows, cutting_path);
            let rows = state
                .export_api
                .export_order_list(&revision_id, Path::new(&order_path))?;
            println!("订单清单已导出: {} 行 -> {}", rows, order_path);
        }

        "revisions" => {
            let [project_id] = expect_args::<1>(&args)?;
            let summaries = state.optimize_api.list_revisions(&project_id)?;
            if summaries.is_empty() {
                println!("工程 {} 暂无修订记录", project_id);
            }
            for s in summaries {
                println!(
                    "#{} [{}] {} 目标={} 优化直径={} 不可行={} RCW={:.2}% 告警={} ({}ms)",
                    s.revision_no,
                    s.status,
                    s.revision_id,
                    s.objective,
                    s.optimized_diameters,
                    s.infeasible_diameters,
                    s.overall_rcw_pct,
                    s.alarm_count,
                    s.elapsed_ms
                );
            }
        }

        other => {
            print_usage();
            return Err(format!("未知子命令: {}", other).into());
        }
    }

    Ok(())
}

/// 取子命令后的 N 个位置参数
fn expect_args<const N: usize>(args: &[String]) -> Result<[String; N], String> {
    let positional = &args[2..];
    if positional.len() < N {
        print_usage();
        return Err(format!("参数不足: 期望至少 {} 个, 实际 {}", N, positional.len()));
    }
    let mut out: [String; N] = std::array::from_fn(|_| String::new());
    out.clone_from_slice(&positional[..N]);
    Ok(out)
}

fn print_revision_summary(result: &rebar_aps::domain::revision::RevisionResultSet) {
    use rebar_aps::domain::revision::{DiameterOutcome, RevisionSummary};

    let summary = RevisionSummary::from_result_set(result);
    println!(
        "修订 #{} ({}) 完成, 目标={}, 耗时 {}ms",
        result.revision_no, result.revision_id, result.objective, result.elapsed_ms
    );
    println!(
        "  需求 {:.3}t / 供给 {:.3}t, 整体 RCW {:.2}%",
        summary.total_required_t, summary.total_supplied_t, summary.overall_rcw_pct
    );

    for (diameter, outcome) in &result.outcomes {
        match outcome {
            DiameterOutcome::Optimized { pattern, metrics } => {
                println!(
                    "  {}: {} 行方案, RCW {:.2}%, CO2 {:.1}kg, 成本 {:.0}",
                    diameter,
                    pattern.line_items.len(),
                    metrics.rcw_pct,
                    metrics.co2_kg,
                    metrics.cost
                );
            }
            DiameterOutcome::Infeasible { reason } => {
                println!("  {}: 不可行 - {}", diameter, reason);
            }
            DiameterOutcome::EmptyDemand => {}
        }
    }

    println!(
        "  捆包 {} / 批次 {} / 订单 {} (告警 {}, 不可行 {})",
        result.bundles.len(),
        result.lots.len(),
        result.schedule.orders.len(),
        result.schedule.alarms().len(),
        result.schedule.infeasible.len()
    );
}
