//! Plain-text rendering for terminal output.

/// Widest a single cell may get before it is cut.
const MAX_CELL_WIDTH: usize = 32;

/// Column-aligned table written to stdout.
pub struct Table {
    headers: Vec<&'static str>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<&'static str>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn row(&mut self, cells: Vec<String>) {
        self.rows
            .push(cells.iter().map(|c| truncate_string(c, MAX_CELL_WIDTH)).collect());
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn render(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if let Some(w) = widths.get_mut(i) {
                    *w = (*w).max(cell.chars().count());
                }
            }
        }

        let line = |cells: Vec<&str>| -> String {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{:<width$}", cell, width = width))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        let mut out = vec![
            line(self.headers.clone()),
            line(rule.iter().map(String::as_str).collect()),
        ];
        for row in &self.rows {
            out.push(line(row.iter().map(String::as_str).collect()));
        }
        out.join("\n")
    }

    /// Print the table, or `empty` when there are no rows.
    pub fn print(&self, empty: &str) {
        if self.is_empty() {
            println!("{}", empty);
        } else {
            println!("{}", self.render());
        }
    }
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

pub fn format_optional(value: &Option<String>) -> String {
    value.as_deref().filter(|v| !v.is_empty()).unwrap_or("-").to_string()
}

/// Order timestamps arrive as HTTP dates or ISO strings; show them as `YYYY-MM-DD HH:MM`.
pub fn format_timestamp(value: &Option<String>) -> String {
    let Some(raw) = value.as_deref().filter(|v| !v.is_empty()) else {
        return "-".to_string();
    };
    if let Ok(dt) = chrono::DateTime::parse_from_rfc2822(raw) {
        dt.format("%Y-%m-%d %H:%M").to_string()
    } else if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        dt.format("%Y-%m-%d %H:%M").to_string()
    } else if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        dt.format("%Y-%m-%d %H:%M").to_string()
    } else {
        raw.to_string()
    }
}

/// Horizontal bar scaled against the largest value in the series.
pub fn bar(value: i64, max: i64, width: usize) -> String {
    if max <= 0 || value <= 0 {
        return String::new();
    }
    let len = ((value as f64 / max as f64) * width as f64).round() as usize;
    "#".repeat(len.clamp(1, width))
}
