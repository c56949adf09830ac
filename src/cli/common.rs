use super::ui;
use crate::orchestrator::ListReport;
use colored::Colorize;
use tabled::{
    settings::{object::Rows, Color, Modify, Style},
    Table, Tabled,
};

#[derive(Tabled)]
struct MappingRow {
    #[tabled(rename = "SELinux Type")]
    se_type: String,
    #[tabled(rename = "Protocol")]
    protocol: String,
    #[tabled(rename = "Ports")]
    ports: String,
}

// Helper to print the `list` snapshot with enhanced formatting
pub fn print_list_report(report: &ListReport) {
    println!(
        "\n{} {}",
        ui::format_header("Firewall zone:"),
        ui::format_highlight(&report.zone_label)
    );

    println!("\n{}", ui::format_header("Open ports:"));
    if report.ports.is_empty() {
        println!("  {}", ui::format_warning("(None)"));
    } else {
        for port in &report.ports {
            println!("  - {}", ui::format_highlight(port));
        }
    }

    println!("\n{}", ui::format_header("Rich rules:"));
    if report.rich_rules.is_empty() {
        println!("  {}", ui::format_warning("(None)"));
    } else {
        for rule in &report.rich_rules {
            println!("  - {}", ui::format_highlight(rule));
        }
    }

    println!(
        "\n{}",
        ui::format_header("SELinux port labels (well-known service types):")
    );
    if report.mappings.is_empty() {
        println!("  {}", ui::format_warning("(None)"));
    } else {
        let data: Vec<_> = report
            .mappings
            .iter()
            .map(|m| MappingRow {
                se_type: ui::format_highlight(&m.se_type),
                protocol: m.protocol.to_string(),
                ports: m.ports_display(),
            })
            .collect();

        let mut table = Table::new(data);
        table
            .with(Style::blank())
            .with(Modify::new(Rows::first()).with(Color::FG_CYAN))
            .with(
                Modify::new(Rows::first())
                    .with(tabled::settings::Format::content(|s| s.bold().to_string())),
            );
        println!("{}", table);
    }
}
