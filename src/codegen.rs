//! codegen lowers a parsed SELECT statement to a bytecode program.
//!
//! Every query compiles to the same shape, the full-table scan:
//!
//! ```text
//! 0  OpenRead   root_page, cursor 0
//! 1  Rewind     cursor 0
//! 2  Column     ...            <- one per selected column
//! .  ResultRow  1..=n
//! .  Next       cursor 0, jump 2
//! .  Halt
//! ```

use anyhow::{bail, Result};

use crate::ast::{CreateStatement, SelItem, SelectStatement};
use crate::pager::PageNum;
use crate::vm::Insn;

/// Lower `select` against a table whose root page and column layout have
/// already been resolved from the schema.
pub fn select_scan_program(
    select: &SelectStatement,
    root_page: PageNum,
    table: &CreateStatement,
) -> Result<Vec<Insn>> {
    let mut columns: Vec<usize> = vec![];
    for item in &select.items {
        match item {
            SelItem::Star => columns.extend(0..table.coldefs.len()),
            SelItem::ColName(name) => {
                match table
                    .coldefs
                    .iter()
                    .position(|c| c.name.eq_ignore_ascii_case(name))
                {
                    Some(i) => columns.push(i),
                    None => bail!("no such column in table {}: {}", table.tablename, name),
                }
            }
        }
    }
    Ok(scan_program(root_page, &columns))
}

/// The canonical scan program over the given column indexes.
pub fn scan_program(root_page: PageNum, columns: &[usize]) -> Vec<Insn> {
    let mut program = vec![
        Insn::OpenRead {
            root_page,
            cursor: 0,
        },
        Insn::Rewind { cursor: 0 },
    ];
    for (i, col) in columns.iter().enumerate() {
        program.push(Insn::Column {
            cursor: 0,
            column: *col,
            dest: i + 1,
        });
    }
    program.push(Insn::ResultRow {
        from: 1,
        to: columns.len(),
    });
    // Loop back to the instruction after the Rewind.
    program.push(Insn::Next { cursor: 0, jump: 2 });
    program.push(Insn::Halt);
    program
}
