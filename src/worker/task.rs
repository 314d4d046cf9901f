// src/worker/task.rs

//! Toy arithmetic each worker performs before sleeping.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Sub,
    Mul,
    Div,
}

impl Operation {
    const ALL: [Operation; 4] = [Operation::Add, Operation::Sub, Operation::Mul, Operation::Div];
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Operation::Add => "+",
            Operation::Sub => "-",
            Operation::Mul => "*",
            Operation::Div => "/",
        };
        f.write_str(symbol)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Integer(i64),
    Ratio(f64),
    Undefined,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{v}"),
            Value::Ratio(v) => write!(f, "{v:.4}"),
            Value::Undefined => f.write_str("undefined"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Computation {
    pub lhs: i64,
    pub op: Operation,
    pub rhs: i64,
}

impl Computation {
    pub fn new(lhs: i64, op: Operation, rhs: i64) -> Self {
        Self { lhs, op, rhs }
    }

    /// Pick operands in `1..=100` and an operation from the worker's index
    /// and pid. Same inputs, same computation.
    pub fn for_worker(index: usize, pid: u32) -> Self {
        let seed = mix(((index as u64) << 32) ^ u64::from(pid));
        let lhs = (seed % 100) as i64 + 1;
        let rhs = ((seed >> 16) % 100) as i64 + 1;
        let op = Operation::ALL[((seed >> 32) % 4) as usize];
        Self::new(lhs, op, rhs)
    }

    pub fn evaluate(&self) -> Value {
        match self.op {
            Operation::Add => Value::Integer(self.lhs + self.rhs),
            Operation::Sub => Value::Integer(self.lhs - self.rhs),
            Operation::Mul => Value::Integer(self.lhs * self.rhs),
            Operation::Div if self.rhs == 0 => Value::Undefined,
            Operation::Div => Value::Ratio(self.lhs as f64 / self.rhs as f64),
        }
    }
}

impl fmt::Display for Computation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} = {}", self.lhs, self.op, self.rhs, self.evaluate())
    }
}

// splitmix64 finaliser
fn mix(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}
