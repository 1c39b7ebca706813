/**
 * FLEET DASHBOARD - Point d'entrée console
 *
 * RÔLE : Démarre un Dashboard avec un renderer console et lui transmet les
 * commandes lues sur stdin, une par ligne.
 *
 * COMMANDES : tab <name> | refresh | substitute on|off | load <path> | asset <id>
 *             | admin <json> | sample | status | quit
 */

use anyhow::{Context, Result};
use fleet_dashboard::controller::{Command, CommandSender};
use fleet_dashboard::models::{AdminConfig, AssetDetail};
use fleet_dashboard::view::{format_number, PanelView};
use fleet_dashboard::{ConnectionState, Dashboard, DashboardOptions, Notice, Renderer, ViewModel};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

struct ConsoleRenderer;

impl Renderer for ConsoleRenderer {
    fn status(&self, state: ConnectionState) {
        println!("[status] {state}");
    }

    fn notify(&self, notice: &Notice) {
        println!("[{:?}] {}", notice.level, notice.message);
    }

    fn render(&self, view: &ViewModel) {
        let tiles: Vec<String> = view.header.tiles.iter().map(|t| format!("{}={}", t.label, t.value)).collect();
        println!("[view] tab={} source={:?} | {}", view.tab, view.source, tiles.join(" | "));
        if let Some(freshness) = &view.header.freshness {
            println!("[view] {freshness}");
        }
        match &view.panel {
            PanelView::Overview(p) => {
                for mover in &p.top_movers {
                    println!("  {:<20} {} mi", mover.asset_name, format_number(Some(mover.miles), 0));
                }
                for item in &p.compliance {
                    println!("  {:<30} {} ({:?})", item.label, item.value, item.status);
                }
            }
            PanelView::Miles(p) => {
                println!("  month: {}", p.month.as_deref().unwrap_or("N/A"));
                for point in &p.by_asset.points {
                    println!("  {:<20} {}", point.label, format_number(Some(point.value), 0));
                }
            }
            PanelView::Maintenance(p) => {
                println!("  overdue={} due_soon={} upcoming={}", p.overdue, p.due_soon, p.upcoming);
                for row in &p.rows {
                    println!("  {:<20} {:<20} {}", row.asset_name, row.service_type, row.status);
                }
            }
            PanelView::Faults(p) => {
                for row in &p.rows {
                    println!("  {:<20} {:<8} {:<8} {}", row.asset_name, row.code, row.severity, row.description);
                }
            }
            PanelView::Assets(p) => {
                for asset in &p.cards {
                    println!(
                        "  [{}] {:<20} odo {} mi, 7d {} mi, faults {}, {}",
                        asset.id,
                        asset.name,
                        format_number(Some(asset.last_known_odo), 0),
                        format_number(Some(asset.miles_7d), 0),
                        asset.active_faults,
                        asset.maint_status
                    );
                }
            }
            PanelView::Admin => {}
        }
    }

    fn populate_admin(&self, config: &AdminConfig) {
        println!(
            "[admin] fy_start_month={} due_soon_miles={} due_soon_days={} utilization_threshold={} odometer_precedence={:?}",
            config.fy_start_month,
            config.due_soon_miles,
            config.due_soon_days,
            config.utilization_threshold,
            config.odometer_precedence
        );
    }

    fn show_asset(&self, detail: &AssetDetail) {
        println!("[asset] {} ({})", detail.asset.name, detail.asset.vin);
        for m in &detail.miles {
            println!("  {} {} mi", m.month, format_number(m.miles, 0));
        }
        for f in &detail.faults {
            println!("  fault {}: {}", f.code, f.description);
        }
        for s in &detail.services {
            println!(
                "  {} - due in {} miles or {} days",
                s.service_type,
                format_number(s.miles_to_due, 0),
                format_number(s.days_to_due, 0)
            );
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env optionnel
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fleet_dashboard=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let dashboard = Arc::new(Dashboard::new(DashboardOptions::default(), Arc::new(ConsoleRenderer)));
    let startup = dashboard.init().await;
    tracing::info!(
        api_base = startup.api_base.as_deref().unwrap_or("-"),
        tab = %startup.tab,
        synced = startup.synced,
        "dashboard started"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }
        if let Err(e) = handle_line(&dashboard, &startup.commands, line).await {
            eprintln!("error: {e:#}");
        }
    }
    Ok(())
}

async fn handle_line(dashboard: &Dashboard, commands: &CommandSender, line: &str) -> Result<()> {
    let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();

    let command = match verb {
        "tab" => Command::SwitchTab(rest.parse()?),
        "refresh" => Command::Refresh,
        "substitute" => match rest {
            "on" => Command::ToggleSubstitute(true),
            "off" => Command::ToggleSubstitute(false),
            other => anyhow::bail!("expected 'substitute on|off', got '{other}'"),
        },
        "load" => {
            let text = tokio::fs::read_to_string(rest)
                .await
                .with_context(|| format!("reading {rest}"))?;
            Command::LoadSubstituteText(text)
        }
        "asset" => Command::ShowAsset(rest.to_string()),
        "admin" => {
            let value: serde_json::Value = serde_json::from_str(rest).context("admin settings must be JSON")?;
            Command::SaveAdmin(AdminConfig::from_value(&value))
        }
        "sample" => {
            println!("{}", serde_json::to_string_pretty(&dashboard.sample_document())?);
            return Ok(());
        }
        "status" => {
            println!(
                "state={} source={:?} tab={} syncing={} substitute_loaded={}",
                dashboard.state(),
                dashboard.current_source(),
                dashboard.active_tab(),
                dashboard.is_syncing(),
                dashboard.has_substitute()
            );
            return Ok(());
        }
        other => anyhow::bail!("unknown command '{other}'"),
    };

    commands.send(command).context("dashboard command loop stopped")?;
    Ok(())
}
