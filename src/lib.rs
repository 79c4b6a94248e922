// System layers, bottom up:
//
// "pager" - hands out raw pages of an open database file behind the
//           PageSource trait (tests substitute an in-memory provider).
// "btree" - walks table btrees with stateful cursors; owns the file-format
//           details (varints, records, cell layouts, page headers).
// "vm"    - a register machine whose instructions drive btree cursors.
// "codegen" / "parser" - turn a SELECT string into a program for the vm.
//
// This file wires the layers together: schema-table lookups and the
// top-level query driver.

pub mod ast;
pub mod btree;
pub mod codegen;
pub mod dbheader;
pub mod formatting;
pub mod pager;
pub mod parser;
pub mod pt_to_ast;
pub mod record;
pub mod serial_type;
pub mod value;
pub mod varint;
pub mod vm;

use anyhow::{anyhow, bail, Result};
use log::debug;

use btree::engine::BtreeEngine;
use pager::{PageNum, PageSource};
use value::{SqlValue, SqlValueBuilder};
use vm::Machine;

// Page 1 (the first page) is always a btree page, and it is the root page
// of the schema table.  It has references to the root pages of other btrees.
const SCHEMA_TABLE_NAME: &str = "sqlite_schema";
const SCHEMA_BTREE_ROOT_PAGENUM: PageNum = 1;
const SCHEMA_SCHEMA: &str =
    "CREATE TABLE sqlite_schema (type text, name text, tbl_name text, rootpage integer, sql text)";
const SCHEMA_TABLE_TYPE_COLIDX: usize = 0;
const SCHEMA_TABLE_TBL_NAME_COLIDX: usize = 2;
const SCHEMA_TABLE_ROOTPAGE_COLIDX: usize = 3;
const SCHEMA_TABLE_SQL_COLIDX: usize = 4;

/// Every row of the schema table, read through the engine and vm with a
/// fixed five-column scan program.
pub fn schema_rows<P: PageSource>(pager: &mut P) -> Result<Vec<Vec<SqlValue>>, btree::Error> {
    let program = codegen::scan_program(SCHEMA_BTREE_ROOT_PAGENUM, &[0, 1, 2, 3, 4]);
    let mut engine = BtreeEngine::new(&mut *pager, SqlValueBuilder);
    Machine::new(SqlValueBuilder).run(&program, &mut engine)
}

/// Get the root page number for, and the SQL CREATE statement used to
/// create, `table_name`.  Returns `None` when the schema table has no row
/// for it.
pub fn get_creation_sql_and_root_pagenum<P: PageSource>(
    pager: &mut P,
    table_name: &str,
) -> Result<Option<(PageNum, String)>> {
    if table_name == SCHEMA_TABLE_NAME {
        return Ok(Some((SCHEMA_BTREE_ROOT_PAGENUM, String::from(SCHEMA_SCHEMA))));
    }
    for row in schema_rows(&mut *pager)? {
        if row[SCHEMA_TABLE_TBL_NAME_COLIDX].as_text().map(String::as_str) != Some(table_name) {
            continue;
        }
        let root_pagenum = *row[SCHEMA_TABLE_ROOTPAGE_COLIDX]
            .as_int()
            .ok_or_else(|| anyhow!("schema rootpage for {} is not an integer", table_name))?;
        if root_pagenum < 1 {
            bail!("schema rootpage for {} is invalid: {}", table_name, root_pagenum);
        }
        let creation_sql = row[SCHEMA_TABLE_SQL_COLIDX]
            .as_text()
            .ok_or_else(|| anyhow!("schema sql for {} is not text", table_name))?;
        return Ok(Some((root_pagenum as PageNum, creation_sql.clone())));
    }
    Ok(None)
}

/// Names of the user tables, for the `.tables` meta-command.
pub fn table_names<P: PageSource>(pager: &mut P) -> Result<Vec<String>> {
    let mut names = vec![];
    for row in schema_rows(&mut *pager)? {
        if row[SCHEMA_TABLE_TYPE_COLIDX].as_text().map(String::as_str) != Some("table") {
            continue;
        }
        if let Some(name) = row[SCHEMA_TABLE_TBL_NAME_COLIDX].as_text() {
            names.push(name.clone());
        }
    }
    Ok(names)
}

/// Parse and execute `query`, returning the output column names and the
/// result rows.
pub fn run_query<P: PageSource>(
    pager: &mut P,
    query: &str,
) -> Result<(Vec<String>, Vec<Vec<SqlValue>>)> {
    // Convert the parse tree to an AST.
    let select = pt_to_ast::parse_select_statement(query)?;
    // Resolve the table against the schema.
    let Some((root_page, creation_sql)) =
        get_creation_sql_and_root_pagenum(&mut *pager, &select.tablename)?
    else {
        bail!("no such table: {}", select.tablename);
    };
    let table = pt_to_ast::parse_create_statement(&creation_sql)?;
    // Lower to bytecode and execute.
    let program = codegen::select_scan_program(&select, root_page, &table)?;
    debug!("compiled program: {:?}", program);
    let mut engine = BtreeEngine::new(&mut *pager, SqlValueBuilder);
    let rows = Machine::new(SqlValueBuilder).run(&program, &mut engine)?;

    let mut column_names = vec![];
    for item in &select.items {
        match item {
            ast::SelItem::Star => {
                column_names.extend(table.coldefs.iter().map(|c| c.name.clone()))
            }
            ast::SelItem::ColName(n) => column_names.push(n.clone()),
        }
    }
    Ok((column_names, rows))
}
