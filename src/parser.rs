//! parser wraps the pest-generated SQL parser.
//!
//! The grammar in `sql.pest` covers exactly the two statement forms the
//! rest of the crate consumes: simple single-table SELECTs, and the CREATE
//! TABLE statements stored in the schema table.

use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "sql.pest"]
pub struct SQLParser;
