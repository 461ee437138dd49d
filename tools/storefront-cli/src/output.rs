//! Output formatting for the CLI.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use storefront_commerce::catalog::Product;
use storefront_commerce::search::Page;

/// Output handler for CLI messages.
#[derive(Clone)]
pub struct Output {
    verbose: bool,
    json: bool,
}

impl Output {
    /// Create a new output handler.
    pub fn new(verbose: bool, json: bool) -> Self {
        Self { verbose, json }
    }

    /// Print an info message.
    pub fn info(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("{} {}", style("ℹ").blue(), msg);
    }

    /// Print a success message.
    pub fn success(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("{} {}", style("✓").green(), msg);
    }

    /// Print a warning message.
    pub fn warn(&self, msg: &str) {
        if self.json {
            return;
        }
        eprintln!("{} {}", style("⚠").yellow(), msg);
    }

    /// Print an error message.
    pub fn error(&self, msg: &str) {
        if self.json {
            eprintln!("{}", serde_json::json!({ "error": msg }));
            return;
        }
        eprintln!("{} {}", style("✗").red(), style(msg).red());
    }

    /// Print a header/title.
    pub fn header(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print JSON output.
    pub fn json<T: serde::Serialize>(&self, value: &T) {
        if let Ok(json) = serde_json::to_string_pretty(value) {
            println!("{}", json);
        }
    }

    /// Print a key-value pair.
    pub fn kv(&self, key: &str, value: &str) {
        if self.json {
            return;
        }
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(&self, item: &str) {
        if self.json {
            return;
        }
        println!("  {} {}", style("•").dim(), item);
    }

    /// Print a table row.
    pub fn table_row(&self, cols: &[&str], widths: &[usize]) {
        if self.json {
            return;
        }
        println!("  {}", format_row(cols, widths));
    }

    /// Create a spinner for indeterminate progress.
    pub fn spinner(&self, msg: &str) -> ProgressBar {
        if self.json {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new_spinner();
        if let Ok(spinner) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }

    /// Check if verbose mode is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Check if JSON mode is enabled.
    pub fn is_json(&self) -> bool {
        self.json
    }
}

fn format_row(cols: &[&str], widths: &[usize]) -> String {
    let formatted: Vec<String> = cols
        .iter()
        .zip(widths.iter())
        .map(|(col, width)| format!("{:width$}", col, width = width))
        .collect();
    formatted.join("  ").trim_end().to_string()
}

/// Availability badge for a product row.
pub fn stock_badge(product: &Product) -> String {
    if !product.active {
        style("Unavailable").dim().to_string()
    } else if product.is_out_of_stock() {
        style("Out of stock").red().to_string()
    } else {
        style(format!("{} in stock", product.stock)).green().to_string()
    }
}

/// Header badge text for a cart holding `count` units.
pub fn cart_badge(count: u64) -> String {
    format!("Cart ({})", count)
}

/// "Page 2 of 5" style label; pages are shown 1-indexed.
pub fn page_label(number: u32, total_pages: u32) -> String {
    format!("Page {} of {}", number + 1, total_pages.max(1))
}

/// Page label followed by the moves available from it, e.g.
/// "Page 2 of 3 [prev / next]". Single pages get the bare label.
pub fn page_footer<T>(page: &Page<T>) -> String {
    let label = page_label(page.number, page.total_pages);
    if !page.is_paginated() {
        return label;
    }

    let moves: Vec<&str> = [(page.has_prev(), "prev"), (page.has_next(), "next")]
        .into_iter()
        .filter_map(|(available, name)| available.then_some(name))
        .collect();
    format!("{} [{}]", label, moves.join(" / "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_row_pads_columns() {
        assert_eq!(format_row(&["1", "Mouse"], &[4, 10]), "1     Mouse");
    }

    #[test]
    fn test_badges_and_labels() {
        assert_eq!(cart_badge(3), "Cart (3)");
        assert_eq!(page_label(0, 3), "Page 1 of 3");
        assert_eq!(page_label(0, 0), "Page 1 of 1");
    }

    fn page(number: u32, total_pages: u32) -> Page<u8> {
        Page {
            content: vec![1],
            total_elements: u64::from(total_pages) * 10,
            total_pages,
            size: 10,
            number,
            first: number == 0,
            last: number + 1 >= total_pages,
        }
    }

    #[test]
    fn test_page_footer_shows_available_moves() {
        assert_eq!(page_footer(&page(0, 1)), "Page 1 of 1");
        assert_eq!(page_footer(&page(0, 3)), "Page 1 of 3 [next]");
        assert_eq!(page_footer(&page(1, 3)), "Page 2 of 3 [prev / next]");
        assert_eq!(page_footer(&page(2, 3)), "Page 3 of 3 [prev]");
    }
}
