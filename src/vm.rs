//! vm is a register-based virtual machine for table scans.
//!
//! A program is a flat list of instructions.  Execution is a plain
//! fetch-decode-execute loop over a program counter, a register file and an
//! output accumulator; the only backward jump is `Next`, which turns the
//! open/rewind/body/next/halt pattern into a full-table scan.  There is no
//! scheduling and no suspension: the machine runs to `Halt` or to the first
//! engine error.

use crate::pager::PageNum;
use crate::value::ValueBuilder;
use std::collections::HashMap;

/// What the machine requires of a storage engine.  The btree engine is the
/// one real implementation; tests may substitute their own.
pub trait TableEngine {
    type Value;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Create cursor `id` over the btree rooted at `root_page`.
    fn new_cursor(&mut self, id: u64, root_page: PageNum) -> Result<bool, Self::Error>;
    /// Move cursor `id` to its first leaf cell; `false` means the tree is empty.
    fn rewind(&mut self, id: u64) -> Result<bool, Self::Error>;
    /// Move cursor `id` to the next leaf cell; `false` means it was on the last.
    fn advance(&mut self, id: u64) -> Result<bool, Self::Error>;
    /// Decode a column of the leaf cell under cursor `id`.
    fn read_column(&mut self, id: u64, column: usize) -> Result<Self::Value, Self::Error>;
}

impl<P, B> TableEngine for crate::btree::engine::BtreeEngine<P, B>
where
    P: crate::pager::PageSource,
    B: ValueBuilder,
{
    type Value = B::Value;
    type Error = crate::btree::Error;

    // Method-call syntax resolves to the engine's inherent methods here,
    // so each line below delegates rather than recursing.
    fn new_cursor(&mut self, id: u64, root_page: PageNum) -> Result<bool, Self::Error> {
        self.new_cursor(id, root_page)
    }

    fn rewind(&mut self, id: u64) -> Result<bool, Self::Error> {
        self.rewind(id)
    }

    fn advance(&mut self, id: u64) -> Result<bool, Self::Error> {
        self.advance(id)
    }

    fn read_column(&mut self, id: u64, column: usize) -> Result<Self::Value, Self::Error> {
        self.read_column(id, column)
    }
}

/// The instruction set.  `P2`-style jump targets are instruction indexes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insn {
    /// Create a read cursor on a root page.
    OpenRead { root_page: PageNum, cursor: u64 },
    /// Move a cursor to the first row of its table.  (A jump-on-empty
    /// variant is reserved; current programs rely on `Next` returning
    /// false instead.)
    Rewind { cursor: u64 },
    /// Advance a cursor; jump back to `jump` while rows remain.
    Next { cursor: u64, jump: usize },
    /// Read a column of the current row into a register.
    Column {
        cursor: u64,
        column: usize,
        dest: usize,
    },
    /// Load an integer literal into a register.
    Integer { value: i64, dest: usize },
    /// Emit registers `from..=to` as one output row.
    ResultRow { from: usize, to: usize },
    /// Stop the machine.
    Halt,
}

/// Sparse register file.  Reading a register that no instruction has
/// written is a bug in the program, not a runtime condition.
pub struct RegisterFile<V> {
    values: HashMap<usize, V>,
}

impl<V> RegisterFile<V> {
    fn new() -> Self {
        RegisterFile {
            values: HashMap::new(),
        }
    }

    pub fn set(&mut self, register: usize, value: V) {
        self.values.insert(register, value);
    }

    pub fn get(&self, register: usize) -> &V {
        self.values
            .get(&register)
            .unwrap_or_else(|| panic!("register {} read before it was written", register))
    }
}

/// One execution of one program.
pub struct Machine<B: ValueBuilder> {
    values: B,
    pc: usize,
    registers: RegisterFile<B::Value>,
    halted: bool,
    output: Vec<Vec<B::Value>>,
}

impl<B: ValueBuilder> Machine<B>
where
    B::Value: Clone,
{
    pub fn new(values: B) -> Self {
        Machine {
            values,
            pc: 0,
            registers: RegisterFile::new(),
            halted: false,
            output: Vec::new(),
        }
    }

    /// Run `program` against `engine`, returning the accumulated rows.
    ///
    /// Engine errors stop execution and propagate unchanged.  Running past
    /// the end of the program is a bug in the program and aborts.
    pub fn run<E>(mut self, program: &[Insn], engine: &mut E) -> Result<Vec<Vec<B::Value>>, E::Error>
    where
        E: TableEngine<Value = B::Value>,
    {
        loop {
            let insn = program
                .get(self.pc)
                .unwrap_or_else(|| panic!("program counter {} is past the end of the program", self.pc));

            match insn {
                Insn::OpenRead { root_page, cursor } => {
                    engine.new_cursor(*cursor, *root_page)?;
                    self.pc += 1;
                }
                Insn::Rewind { cursor } => {
                    engine.rewind(*cursor)?;
                    self.pc += 1;
                }
                Insn::Next { cursor, jump } => {
                    if engine.advance(*cursor)? {
                        self.pc = *jump;
                    } else {
                        self.pc += 1;
                    }
                }
                Insn::Column {
                    cursor,
                    column,
                    dest,
                } => {
                    let v = engine.read_column(*cursor, *column)?;
                    self.registers.set(*dest, v);
                    self.pc += 1;
                }
                Insn::Integer { value, dest } => {
                    self.registers.set(*dest, self.values.integer(*value));
                    self.pc += 1;
                }
                Insn::ResultRow { from, to } => {
                    let row = (*from..=*to)
                        .map(|r| self.registers.get(r).clone())
                        .collect();
                    self.output.push(row);
                    self.pc += 1;
                }
                Insn::Halt => {
                    self.halted = true;
                }
            }

            if self.halted {
                break;
            }
        }
        Ok(self.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{SqlValue, SqlValueBuilder};

    // An engine that panics if touched: register-only programs never reach it.
    struct NoEngine;

    impl TableEngine for NoEngine {
        type Value = SqlValue;
        type Error = crate::btree::Error;

        fn new_cursor(&mut self, _: u64, _: PageNum) -> Result<bool, Self::Error> {
            unreachable!("program should not touch the engine")
        }
        fn rewind(&mut self, _: u64) -> Result<bool, Self::Error> {
            unreachable!("program should not touch the engine")
        }
        fn advance(&mut self, _: u64) -> Result<bool, Self::Error> {
            unreachable!("program should not touch the engine")
        }
        fn read_column(&mut self, _: u64, _: usize) -> Result<Self::Value, Self::Error> {
            unreachable!("program should not touch the engine")
        }
    }

    #[test]
    fn test_integer_result_row_halt() {
        let program = vec![
            Insn::Integer { value: 3, dest: 1 },
            Insn::Integer { value: -5, dest: 2 },
            Insn::ResultRow { from: 1, to: 2 },
            Insn::Halt,
        ];
        let out = Machine::new(SqlValueBuilder)
            .run(&program, &mut NoEngine)
            .unwrap();
        assert_eq!(out, vec![vec![SqlValue::Int(3), SqlValue::Int(-5)]]);
    }

    #[test]
    fn test_halt_emits_nothing() {
        let program = vec![Insn::Halt];
        let out = Machine::new(SqlValueBuilder)
            .run(&program, &mut NoEngine)
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_register_overwrite_keeps_last_value() {
        let program = vec![
            Insn::Integer { value: 1, dest: 1 },
            Insn::Integer { value: 2, dest: 1 },
            Insn::ResultRow { from: 1, to: 1 },
            Insn::Halt,
        ];
        let out = Machine::new(SqlValueBuilder)
            .run(&program, &mut NoEngine)
            .unwrap();
        assert_eq!(out, vec![vec![SqlValue::Int(2)]]);
    }

    #[test]
    #[should_panic(expected = "read before it was written")]
    fn test_unwritten_register_is_fatal() {
        let program = vec![Insn::ResultRow { from: 1, to: 1 }, Insn::Halt];
        let _ = Machine::new(SqlValueBuilder).run(&program, &mut NoEngine);
    }
}
