//! Format forest views, listings, and move reports as text.

use crate::mutation::MoveReport;
use crate::selector::{FolderView, ForestView};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

/// Format a section heading with bold/underline. Respects NO_COLOR and TTY.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

/// Format the whole forest as indented trees, one section per root.
pub fn format_forest_text(view: &ForestView) -> String {
    let mut out = String::new();
    for (i, root) in view.roots.iter().enumerate() {
        let title = if i == 0 { "Master" } else { "Course root" };
        out.push_str(&format!("{}\n", format_section_heading(title)));
        push_folder_lines(&mut out, root, 0);
        out.push('\n');
    }
    if view.roots.is_empty() {
        out.push_str("No roots loaded.\n");
    }
    out
}

/// Format one folder subtree as an indented tree.
pub fn format_folder_tree(folder: &FolderView) -> String {
    let mut out = String::new();
    push_folder_lines(&mut out, folder, 0);
    out
}

fn push_folder_lines(out: &mut String, folder: &FolderView, depth: usize) {
    let indent = "  ".repeat(depth);
    let marker = if folder.fetched { "▾" } else { "▸" };
    let selected = if folder.selected { " *" } else { "" };
    let note = if folder.fetched { "" } else { " (not fetched)" };
    out.push_str(&format!(
        "{}{} {} [{}]{}{}\n",
        indent, marker, folder.name, folder.id, note, selected
    ));
    for file in &folder.files {
        let selected = if file.selected { " *" } else { "" };
        out.push_str(&format!(
            "{}  • {} [{}]{}\n",
            indent, file.name, file.id, selected
        ));
    }
    for child in &folder.subfolders {
        push_folder_lines(out, child, depth + 1);
    }
}

/// Format a folder's immediate contents as a table.
pub fn format_folder_listing(folder: &FolderView) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}\n\n",
        format_section_heading(&format!("{} [{}]", folder.name, folder.id))
    ));
    if folder.subfolders.is_empty() && folder.files.is_empty() {
        out.push_str("Empty folder.\n");
        return out;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Kind", "ID", "Name", "State"]);
    for sub in &folder.subfolders {
        let state = if sub.fetched { "fetched" } else { "collapsed" };
        table.add_row(vec![
            "folder".to_string(),
            sub.id.to_string(),
            sub.name.clone(),
            state.to_string(),
        ]);
    }
    for file in &folder.files {
        table.add_row(vec![
            "file".to_string(),
            file.id.to_string(),
            file.name.clone(),
            String::new(),
        ]);
    }
    out.push_str(&format!("{}\n", table));
    out
}

/// Format a user-facing warning line.
pub fn format_warning(message: &str) -> String {
    format!("{}", message.yellow())
}

/// Format a move outcome, flagging partial failures.
pub fn format_move_report(report: &MoveReport) -> String {
    let mut out = format!(
        "Moved {} file(s) and {} folder(s).\n",
        report.moved_files, report.moved_folders
    );
    if let Some(e) = &report.file_failure {
        out.push_str(&format!("{}\n", format!("File batch failed: {}", e).yellow()));
    }
    if let Some(e) = &report.folder_failure {
        out.push_str(&format!(
            "{}\n",
            format!("Folder batch failed: {}", e).yellow()
        ));
    }
    if report.is_partial() {
        out.push_str(&format!(
            "{}\n",
            "The successful batch was not rolled back; the trees may need a refresh."
                .yellow()
        ));
    }
    out
}
