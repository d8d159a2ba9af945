// ==========================================
// NSPIRE 合规系统 - 命令行入口
// ==========================================
// 用法:
//   nspire-compliance calc <severity>
//   nspire-compliance add <id|-> <severity> [description]
//   nspire-compliance show <id>
//   nspire-compliance list
//   nspire-compliance overdue
//   nspire-compliance due-soon
//   nspire-compliance correct <id>
//
// 数据库路径: NSPIRE_COMPLIANCE_DB_PATH 或用户数据目录
// ==========================================

use anyhow::Result;
use serde::Serialize;

use nspire_compliance::api::{CreateDeficiencyRequest, DeficiencyView};
use nspire_compliance::app::{get_default_db_path, AppState};
use nspire_compliance::{i18n, logging};

const DEFAULT_LIST_LIMIT: i64 = 100;

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_views(views: &[DeficiencyView]) -> Result<()> {
    if views.is_empty() {
        println!("{}", i18n::t("cli.empty"));
        return Ok(());
    }
    print_json(&views)
}

fn usage() -> anyhow::Error {
    anyhow::anyhow!(i18n::t("cli.usage"))
}

fn main() -> Result<()> {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first().map(String::as_str) else {
        return Err(usage());
    };

    let db_path = get_default_db_path();
    tracing::info!(version = nspire_compliance::VERSION, "使用数据库: {}", db_path);

    let state = AppState::new(db_path).map_err(anyhow::Error::msg)?;
    state.apply_locale();
    let api = &state.deficiency_api;

    match (command, &args[1..]) {
        ("calc", [severity]) => {
            let quote = api.calculate_deadline(Some(severity.as_str()));
            match quote.deadline {
                Some(deadline) => {
                    let text = deadline.to_rfc3339();
                    println!("{}", i18n::t_with_args("cli.deadline", &[("deadline", text.as_str())]));
                }
                None => println!("{}", i18n::t("cli.no_deadline")),
            }
            print_json(&quote)?;
        }
        ("add", [id, severity, rest @ ..]) => {
            let description = if rest.is_empty() { None } else { Some(rest.join(" ")) };
            let request = CreateDeficiencyRequest {
                deficiency_id: (id != "-").then(|| id.clone()),
                severity: Some(severity.clone()),
                description,
                ..Default::default()
            };
            print_json(&api.create_deficiency(request)?)?;
        }
        ("show", [id]) => print_json(&api.get_deficiency(id)?)?,
        ("list", []) => print_views(&api.list_deficiencies(DEFAULT_LIST_LIMIT, 0)?)?,
        ("overdue", []) => print_views(&api.list_overdue()?)?,
        ("due-soon", []) => print_views(&api.list_due_soon()?)?,
        ("correct", [id]) => {
            let view = api.mark_corrected(id)?;
            println!("{}", i18n::t_with_args("cli.corrected", &[("id", view.item.deficiency_id.as_str())]));
        }
        _ => return Err(usage()),
    }

    Ok(())
}
