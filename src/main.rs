use anyhow::{bail, Result};
use log::info;

use sqlvm::formatting;
use sqlvm::pager::{FilePager, PageSource};

// Usage:
//   sqlvm sample.db .dbinfo
//   sqlvm sample.db .tables
//   sqlvm sample.db "SELECT a, b FROM users"
fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        bail!("usage: {} <database path> <command>", args[0]);
    }
    let (path, command) = (&args[1], &args[2]);

    let mut pager = FilePager::open(path)?;
    info!("opened database {}", path);

    match command.as_str() {
        ".dbinfo" => {
            let header = pager.header();
            println!("database page size: {}", header.page_size);
            println!("database page count: {}", header.num_pages);
            let names = sqlvm::table_names(&mut pager)?;
            println!("number of tables: {}", names.len());
        }
        ".tables" => {
            let names = sqlvm::table_names(&mut pager)?;
            println!("{}", names.join(" "));
        }
        query => {
            let (column_names, rows) = sqlvm::run_query(&mut pager, query)?;
            formatting::print_rows(&column_names, &rows);
        }
    }

    pager.close()?;
    Ok(())
}
