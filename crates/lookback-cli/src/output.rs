//! Output formatting utilities.

use colored::Colorize;

/// Format a table.
pub fn format_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    // Column widths in characters, not bytes
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let mut output = String::new();

    let header_line = headers
        .iter()
        .zip(&widths)
        .map(|(h, &width)| format!("{:width$}", h))
        .collect::<Vec<_>>()
        .join(" │ ");
    output.push_str(&format!("{}\n", header_line.bright_cyan().bold()));

    let sep = widths
        .iter()
        .map(|w| "─".repeat(*w))
        .collect::<Vec<_>>()
        .join("─┼─");
    output.push_str(&format!("{}\n", sep));

    for row in rows {
        let row_line = row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let width = widths.get(i).copied().unwrap_or(0);
                format!("{:width$}", cell)
            })
            .collect::<Vec<_>>()
            .join(" │ ");
        output.push_str(&format!("{}\n", row_line));
    }

    output
}

/// Format a key-value list.
pub fn format_kv_list(items: &[(&str, String)]) -> String {
    let max_key_len = items.iter().map(|(k, _)| k.len()).max().unwrap_or(0);

    items
        .iter()
        .map(|(k, v)| {
            format!(
                "  {}: {}",
                format!("{:width$}", k, width = max_key_len).bright_cyan(),
                v
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format duration.
pub fn format_duration(seconds: f64) -> String {
    if seconds < 0.001 {
        format!("{:.2} µs", seconds * 1_000_000.0)
    } else if seconds < 1.0 {
        format!("{:.2} ms", seconds * 1000.0)
    } else if seconds < 60.0 {
        format!("{:.2} s", seconds)
    } else {
        format!("{:.1} min", seconds / 60.0)
    }
}

/// Format number with commas.
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);

    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    result
}

/// Format a ratio as a percentage.
pub fn format_percentage(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

/// Print a section header.
pub fn print_section(title: &str) {
    println!("\n{}", title.bright_green().bold());
    println!("{}", "─".repeat(title.len()).bright_green());
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("  {} {}", "✓".bright_green(), message);
}

/// Print an error message.
pub fn print_error(message: &str) {
    println!("    {} {}", "✗".bright_red(), message);
}

/// Print a warning message.
pub fn print_warning(message: &str) {
    println!("    {} {}", "⚠".bright_yellow(), message);
}
