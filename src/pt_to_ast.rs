//! `pt_to_ast` has routines for converting parse trees to ASTs for SQL.
//!
//! A pest parse tree has one enum for all possible terminals and
//! non-terminals; the AST keeps just the structure the code generator
//! needs and discards lexical detail like case and position.

use anyhow::{anyhow, Result};
use itertools::Itertools;
use pest::Parser;

use crate::ast;
use crate::parser::{Rule, SQLParser};

pub fn parse_select_statement(query: &str) -> Result<ast::SelectStatement> {
    let select_stmt = SQLParser::parse(Rule::select_stmt, query)
        .map_err(|e| anyhow!("syntax error in SELECT statement:\n{}", e))?
        .next()
        .unwrap();

    let mut items = vec![];
    let mut tablename = String::new();
    for s in select_stmt.into_inner() {
        match s.as_rule() {
            Rule::select_item => {
                let item = s.into_inner().next().unwrap();
                match item.as_rule() {
                    Rule::star => items.push(ast::SelItem::Star),
                    Rule::column_name => {
                        items.push(ast::SelItem::ColName(String::from(item.as_str())))
                    }
                    _ => unreachable!(),
                }
            }
            Rule::table_identifier => tablename = String::from(s.as_str()),
            Rule::EOI => (),
            _ => unreachable!(),
        }
    }
    Ok(ast::SelectStatement { items, tablename })
}

pub fn parse_create_statement(c: &str) -> Result<ast::CreateStatement> {
    let create_stmt = SQLParser::parse(Rule::create_stmt, c)
        .map_err(|e| anyhow!("syntax error in CREATE statement:\n{}", e))?
        .next()
        .unwrap();

    let mut tablename = String::new();
    let mut coldefs = vec![];
    for c in create_stmt.into_inner() {
        match c.as_rule() {
            Rule::table_identifier => tablename = String::from(c.as_str()),
            Rule::column_defs => {
                for column_def in c.into_inner() {
                    match column_def.as_rule() {
                        Rule::column_def => {
                            let (name, coltype) = column_def
                                .into_inner()
                                .take(2)
                                .map(|e| String::from(e.as_str()))
                                .collect_tuple()
                                .unwrap();
                            coldefs.push(ast::ColDef { name, coltype });
                        }
                        _ => unreachable!(),
                    }
                }
            }
            Rule::EOI => (),
            _ => unreachable!(),
        }
    }
    Ok(ast::CreateStatement { tablename, coldefs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::SelItem;

    #[test]
    fn test_parse_select_columns() {
        let ss = parse_select_statement("select a, b from t").unwrap();
        assert_eq!(ss.tablename, "t");
        assert_eq!(
            ss.items,
            vec![
                SelItem::ColName(String::from("a")),
                SelItem::ColName(String::from("b"))
            ]
        );
    }

    #[test]
    fn test_parse_select_star() {
        let ss = parse_select_statement("SELECT * FROM users;").unwrap();
        assert_eq!(ss.tablename, "users");
        assert_eq!(ss.items, vec![SelItem::Star]);
    }

    #[test]
    fn test_parse_select_rejects_garbage() {
        assert!(parse_select_statement("select from").is_err());
        assert!(parse_select_statement("delete from t").is_err());
    }

    #[test]
    fn test_parse_create() {
        let cs = parse_create_statement("CREATE TABLE t (a int, b text, c real)").unwrap();
        assert_eq!(cs.tablename, "t");
        assert_eq!(cs.coldefs.len(), 3);
        assert_eq!(cs.coldefs[0].name, "a");
        assert_eq!(cs.coldefs[0].coltype, "int");
        assert_eq!(cs.coldefs[1].name, "b");
        assert_eq!(cs.coldefs[1].coltype, "text");
    }
}
