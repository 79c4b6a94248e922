//! formatting prints result rows nicely.

use crate::value::SqlValue;

pub fn print_rows(column_names: &[String], rows: &[Vec<SqlValue>]) {
    println!(
        "| {} |",
        column_names
            .iter()
            .map(|x| format!("{:15}", x))
            .collect::<Vec<String>>()
            .join(" | ")
    );
    for row in rows {
        println!(
            "| {} |",
            row.iter()
                .map(|v| format!("{:15}", v))
                .collect::<Vec<String>>()
                .join(" | ")
        );
    }
}
