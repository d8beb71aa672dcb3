use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use rol_core::Result;
use serde::Serialize;

pub fn build_table(headers: &[&str], rows: &[Vec<String>]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers.iter().map(|h| Cell::new(h).fg(Color::Cyan)));
    for row in rows {
        table.add_row(row.iter().map(Cell::new));
    }
    table
}

pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    println!("{}", build_table(headers, rows));
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_table() {
        let rows = vec![
            vec!["Pillar 1".to_string(), "12".to_string()],
            vec!["Pillar 2".to_string(), "3".to_string()],
        ];
        let mut table = build_table(&["Pillar", "Articles"], &rows);
        table.force_no_tty();

        assert_eq!(table.row_iter().count(), 2);
        let rendered = table.to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert!(lines[1].contains("Pillar") && lines[1].contains("Articles"));
        assert!(rendered.contains("Pillar 1"));
        assert!(rendered.contains("12"));
        assert!(lines.iter().any(|l| l.contains("Pillar 2") && l.contains('3')));
    }
}
