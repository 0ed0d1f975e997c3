use colored::*;
use std::io::{self, Write};

/// Console handles all terminal output with colored formatting
pub struct Console {
    user_color: Color,
    assistant_color: Color,
    tool_color: Color,
}

impl Console {
    /// Create a new Console with default colors
    pub fn new() -> Self {
        Self {
            user_color: Color::Cyan,
            assistant_color: Color::Green,
            tool_color: Color::Magenta,
        }
    }

    fn flush(&self) {
        // A failed flush on a terminal only delays output
        let _ = io::stdout().flush();
    }

    /// Print a complete assistant message with colored formatting
    pub fn print_assistant(&self, message: &str) {
        println!();
        println!(
            "{} {}",
            "Assistant:".color(self.assistant_color).bold(),
            message.color(self.assistant_color)
        );
    }

    /// Print a newline
    pub fn println(&self) {
        println!();
    }

    /// Print a system message (status, info, etc.)
    pub fn print_system(&self, message: &str) {
        println!("{} {}", "System:".yellow().bold(), message);
    }

    /// Print plain text
    pub fn print_plain(&self, message: &str) {
        println!("{}", message);
    }

    /// Print an error message
    pub fn print_error(&self, error: &str) {
        eprintln!("{} {}", "Error:".red().bold(), error);
    }

    /// Print the input prompt (without newline)
    pub fn print_prompt(&self) {
        print!("\n{} ", "You:".color(self.user_color).bold());
        self.flush();
    }

    /// Print a banner with a title and optional intro lines
    pub fn print_banner(&self, title: &str, intro: &[String]) {
        println!();
        println!("{}", "=".repeat(50).bright_blue());
        println!("{}", title.bright_blue().bold());
        println!("{}", "=".repeat(50).bright_blue());
        println!();
        for line in intro {
            println!("{}", line);
        }
        if !intro.is_empty() {
            println!();
        }
    }

    /// Print a separator line
    pub fn print_separator(&self) {
        println!("{}", "-".repeat(50).bright_black());
    }

    /// Print a tool action message
    pub fn print_tool_action(&self, tool_name: &str, action: &str) {
        println!(
            "{} {} {}",
            "Tool:".color(self.tool_color).bold(),
            format!("[{}]", tool_name).color(self.tool_color),
            action
        );
    }

    /// Print a thinking indicator
    pub fn print_thinking(&self) {
        print!("{}", "Thinking...".bright_black());
        self.flush();
    }

    /// Clear the thinking indicator
    pub fn clear_thinking(&self) {
        print!("\r{}\r", " ".repeat(20));
        self.flush();
    }

    /// Print a numbered menu
    pub fn print_menu(&self, title: &str, options: &[(&str, &str)]) {
        println!();
        println!("{}", title.bright_white().bold());
        for (key, label) in options {
            println!("  {} {}", format!("[{}]", key).color(self.user_color), label);
        }
    }

    /// Print rows as a fixed-width table
    pub fn print_table(&self, headers: &[&str], rows: &[Vec<String>]) {
        println!("{}", render_table(headers, rows));
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

/// Lay out rows under headers, each column as wide as its widest cell
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let format_row = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{:<width$}", cell, width = widths[i]))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut lines = vec![format_row(headers.to_vec())];
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    for row in rows {
        let cells: Vec<&str> = (0..widths.len())
            .map(|i| row.get(i).map(|s| s.as_str()).unwrap_or(""))
            .collect();
        lines.push(format_row(cells));
    }

    lines.join("\n")
}
