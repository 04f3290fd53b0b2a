use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use tmrx_demux::RunSummary;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

pub fn print_summary(summary: &RunSummary, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(summary).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => println!("{}", summary_table(summary)),
        OutputFormat::Pretty => println!("{}", summary_line(summary)),
    }
}

fn summary_rows(summary: &RunSummary) -> Vec<(&'static str, String)> {
    vec![
        ("elapsed", format!("{:.1}s", summary.elapsed_secs)),
        ("packets", summary.packets_received.to_string()),
        ("bytes", summary.bytes_received.to_string()),
        ("images archived", summary.images_archived.to_string()),
        ("catalogs closed", summary.catalogs_closed.to_string()),
        ("catalogs archived", summary.catalogs_archived.to_string()),
        ("crc failures", summary.crc_failures.to_string()),
        ("anomalies", summary.anomalies.to_string()),
        ("final state", summary.final_state.to_string()),
        ("exit", summary.exit_reason.clone()),
    ]
}

fn summary_table(summary: &RunSummary) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["FIELD", "VALUE"]);
    for (field, value) in summary_rows(summary) {
        table.add_row(vec![field.to_string(), value]);
    }
    table
}

fn summary_line(summary: &RunSummary) -> String {
    summary_rows(summary)
        .into_iter()
        .map(|(field, value)| format!("{}={}", field.replace(' ', "_"), value))
        .collect::<Vec<_>>()
        .join(" ")
}
