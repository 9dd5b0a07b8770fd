use atty::Stream;
use color_eyre::Result;
use serde_json::Value;
use vidledger_core::{CommandGroup, CommandInfo, CommandStatus, ExecutionOutcome};

use crate::style::Style;

#[derive(Clone, Copy, Debug)]
pub struct OutputOptions {
    pub quiet: bool,
    pub json: bool,
    pub no_color: bool,
}

pub fn emit_output(opts: &OutputOptions, info: CommandInfo, outcome: &ExecutionOutcome) -> Result<i32> {
    let code = outcome.status.exit_code();

    if opts.json {
        let payload = vidledger_core::to_json_response(info, outcome);
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(code);
    }

    let message = vidledger_core::format_status_message(info, &outcome.message);
    if opts.quiet {
        if outcome.status != CommandStatus::Ok {
            let style = Style::new(opts.no_color, atty::is(Stream::Stderr));
            eprintln!("{}", style.status(outcome.status, &message));
        }
        return Ok(code);
    }

    let style = Style::new(opts.no_color, atty::is(Stream::Stdout));
    if let Some(table) = render_file_table(&style, info, &outcome.details) {
        println!("{table}");
        println!();
    }
    println!("{}", style.status(outcome.status, &message));
    if outcome.status == CommandStatus::Ok {
        if let Some(hint) = hint_from_details(&outcome.details) {
            println!("{}", style.info(&format!("Tip: {hint}")));
        }
    } else {
        println!();
        println!("Why:");
        for reason in collect_why_bullets(&outcome.details, &outcome.message) {
            println!("  • {reason}");
        }
        println!();
        println!("Fix:");
        for fix in collect_fix_bullets(&outcome.details) {
            println!("{}", style.fix_bullet(&format!("  • {fix}")));
        }
    }

    Ok(code)
}

fn hint_from_details(details: &Value) -> Option<&str> {
    details
        .as_object()
        .and_then(|map| map.get("hint"))
        .and_then(Value::as_str)
}

struct FileRow {
    video: String,
    result: String,
    detail: String,
}

fn render_file_table(style: &Style, info: CommandInfo, details: &Value) -> Option<String> {
    if info.group != CommandGroup::Upload {
        return None;
    }
    let files = details.get("files")?.as_array()?;
    if files.is_empty() {
        return None;
    }
    let rows: Vec<FileRow> = files.iter().filter_map(file_row).collect();
    Some(format_file_table(style, &rows))
}

fn file_row(entry: &Value) -> Option<FileRow> {
    let result = entry.get("result")?.as_str()?;
    let video = entry
        .get("video_name")
        .or_else(|| entry.get("record").and_then(|record| record.get("video_name")))
        .and_then(Value::as_str)?;
    let detail = match result {
        "uploaded" => entry
            .pointer("/record/data_row_id")
            .and_then(Value::as_str)
            .map(|id| format!("data row {id}")),
        "skipped" => entry
            .get("dataset_name")
            .and_then(Value::as_str)
            .map(|dataset| format!("already in {dataset}")),
        "pending" => entry
            .get("source")
            .and_then(Value::as_str)
            .map(ToString::to_string),
        _ => entry.get("error").and_then(Value::as_str).map(ToString::to_string),
    };
    Some(FileRow {
        video: video.to_string(),
        result: result.replace('_', " "),
        detail: detail.unwrap_or_default(),
    })
}

fn format_file_table(style: &Style, rows: &[FileRow]) -> String {
    let headers = ["Video", "Result", "Detail"];
    let mut widths = [headers[0].len(), headers[1].len()];
    for row in rows {
        widths[0] = widths[0].max(row.video.chars().count());
        widths[1] = widths[1].max(row.result.len());
    }

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(style.table_header(&format!(
        "{:<width0$}  {:<width1$}  {}",
        headers[0],
        headers[1],
        headers[2],
        width0 = widths[0],
        width1 = widths[1],
    )));
    lines.push(format!(
        "{:-<width0$}  {:-<width1$}  {:-<6}",
        "",
        "",
        "",
        width0 = widths[0],
        width1 = widths[1],
    ));
    for row in rows {
        let result = format!("{:<width$}", row.result, width = widths[1]);
        let raw = row.result.replace(' ', "_");
        let line = format!(
            "{:<width0$}  {}  {}",
            row.video,
            style.result_cell(&raw, &result),
            row.detail,
            width0 = widths[0],
        );
        lines.push(line.trim_end().to_string());
    }
    lines.join("\n")
}

fn collect_why_bullets(details: &Value, fallback: &str) -> Vec<String> {
    let mut bullets = Vec::new();
    if let Some(reason) = details.get("reason").and_then(Value::as_str) {
        push_unique(&mut bullets, reason_display(reason).unwrap_or(reason));
    }
    if let Some(missing) = details.get("missing").and_then(Value::as_array) {
        let keys: Vec<&str> = missing.iter().filter_map(Value::as_str).collect();
        if !keys.is_empty() {
            push_unique(&mut bullets, format!("Not set: {}", keys.join(", ")));
        }
    }
    if let Some(failed) = details.get("failed").and_then(Value::as_u64) {
        if failed > 0 {
            push_unique(&mut bullets, format!("{failed} file(s) could not be converted or uploaded"));
        }
    }
    if let Some(issues) = details.get("issues").and_then(Value::as_array) {
        for issue in issues.iter().filter_map(Value::as_str) {
            push_unique(&mut bullets, issue);
        }
    }
    if bullets.is_empty() {
        bullets.push(fallback.to_string());
    }
    bullets
}

fn collect_fix_bullets(details: &Value) -> Vec<String> {
    let mut fixes = Vec::new();
    if let Some(hint) = hint_from_details(details) {
        push_unique(&mut fixes, hint);
    }
    if fixes.is_empty() {
        fixes.push("Re-run with --help for usage or inspect the output above.".to_string());
    }
    fixes
}

fn push_unique(vec: &mut Vec<String>, text: impl Into<String>) {
    let entry = text.into();
    if entry.trim().is_empty() {
        return;
    }
    if !vec.iter().any(|existing| existing == &entry) {
        vec.push(entry);
    }
}

fn reason_display(code: &str) -> Option<&'static str> {
    match code {
        "missing_config" => Some("Required configuration is missing."),
        "invalid_config" => Some("A configured path cannot be used."),
        "missing_folder" => Some("The video folder does not exist."),
        "auth_rejected" => Some("Labelbox rejected the API key."),
        "internal_error" => Some("vidledger hit an unexpected error."),
        _ => None,
    }
}
