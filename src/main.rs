// ==========================================
// 车队维保系统 - 命令行入口
// ==========================================
// 输出: 成功 → JSON 结果(stdout)；失败 → JSON 错误体(stdout) + 退出码 1
// 数据库: FLEET_MAINTENANCE_DB_PATH 或用户数据目录
// ==========================================

use anyhow::{bail, Context};
use fleet_maintenance::api::{ApiResult, EditRequest};
use fleet_maintenance::app::{get_default_db_path, AppState};
use serde::Serialize;

const USAGE: &str = "\
用法:
  fleet-maintenance import <文件> <车型> <计划名称>
  fleet-maintenance list
  fleet-maintenance show <计划ID>
  fleet-maintenance matrix <计划ID>
  fleet-maintenance edit <计划ID> <作业ID> <区间ID> <true|false>
  fleet-maintenance next-due <计划ID> <小时> <公里>
  fleet-maintenance activate|deactivate <计划ID>
  fleet-maintenance config-set <键> <值>
  fleet-maintenance config-show";

/// 打印 API 结果，返回是否成功
fn emit<T: Serialize>(result: ApiResult<T>) -> anyhow::Result<bool> {
    match result {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(true)
        }
        Err(err) => {
            tracing::warn!(error = %err, "命令执行失败");
            println!("{}", serde_json::to_string_pretty(&err.to_response())?);
            Ok(false)
        }
    }
}

fn arg<'a>(args: &'a [String], index: usize, name: &str) -> anyhow::Result<&'a str> {
    args.get(index)
        .map(String::as_str)
        .with_context(|| format!("缺少参数 <{}>\n{}", name, USAGE))
}

fn parse_f64(raw: &str, name: &str) -> anyhow::Result<f64> {
    raw.trim()
        .parse::<f64>()
        .with_context(|| format!("参数 <{}> 不是数字: {}", name, raw))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fleet_maintenance::logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first().map(String::as_str) else {
        println!("{} v{}\n\n{}", fleet_maintenance::APP_NAME, fleet_maintenance::VERSION, USAGE);
        return Ok(());
    };

    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);
    let state = AppState::new(db_path).map_err(anyhow::Error::msg)?;

    let ok = match command {
        "import" => {
            let file = arg(&args, 1, "文件")?;
            let vehicle_type = arg(&args, 2, "车型")?;
            let name = arg(&args, 3, "计划名称")?;
            emit(state.import_api.import_schedule(file, vehicle_type, name).await)?
        }
        "list" => emit(state.plan_api.list_plans())?,
        "show" => emit(state.plan_api.get_plan_detail(arg(&args, 1, "计划ID")?))?,
        "matrix" => emit(state.matrix_api.get_matrix(arg(&args, 1, "计划ID")?))?,
        "edit" => {
            let applies = match arg(&args, 4, "true|false")? {
                "true" | "1" | "x" => true,
                "false" | "0" | "-" => false,
                other => bail!("无法识别的标记值: {}", other),
            };
            let request = EditRequest {
                plan_id: arg(&args, 1, "计划ID")?.to_string(),
                activity_id: arg(&args, 2, "作业ID")?.to_string(),
                interval_id: arg(&args, 3, "区间ID")?.to_string(),
                applies,
            };
            emit(state.matrix_api.apply_edit(&request))?
        }
        "next-due" => {
            let plan_id = arg(&args, 1, "计划ID")?;
            let hours = parse_f64(arg(&args, 2, "小时")?, "小时")?;
            let kilometers = parse_f64(arg(&args, 3, "公里")?, "公里")?;
            emit(state.plan_api.next_maintenance(plan_id, hours, kilometers))?
        }
        "activate" | "deactivate" => {
            let plan_id = arg(&args, 1, "计划ID")?;
            emit(state.plan_api.set_plan_active(plan_id, command == "activate"))?
        }
        "config-set" => {
            let key = arg(&args, 1, "键")?;
            let value = arg(&args, 2, "值")?;
            state
                .config_manager
                .set_config_value(key, value)
                .map_err(|e| anyhow::anyhow!("写入配置失败: {}", e))?;
            println!("{} = {}", key, value);
            true
        }
        "config-show" => {
            let snapshot = state
                .config_manager
                .get_config_snapshot()
                .map_err(|e| anyhow::anyhow!("读取配置失败: {}", e))?;
            println!("{}", snapshot);
            true
        }
        other => bail!("未知命令: {}\n{}", other, USAGE),
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
