//! Indicator compare rule.
//!
//! A `SignalRule` compares two indicator columns at the newest bar: the buy
//! condition puts a symbol on the buy list, the sell condition on the sell
//! list. Both are evaluated independently, so a symbol can land on both.

use std::fmt;
use std::str::FromStr;

const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Ne,
}

impl Comparison {
    pub fn apply(self, left: f64, right: f64) -> bool {
        match self {
            Comparison::Gt => left > right,
            Comparison::Ge => left >= right,
            Comparison::Lt => left < right,
            Comparison::Le => left <= right,
            Comparison::Eq => (left - right).abs() < EPSILON,
            Comparison::Ne => (left - right).abs() >= EPSILON,
        }
    }
}

impl FromStr for Comparison {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gt" | ">" => Ok(Comparison::Gt),
            "ge" | ">=" => Ok(Comparison::Ge),
            "lt" | "<" => Ok(Comparison::Lt),
            "le" | "<=" => Ok(Comparison::Le),
            "eq" | "==" => Ok(Comparison::Eq),
            "ne" | "!=" => Ok(Comparison::Ne),
            other => Err(format!("unknown comparison '{other}'")),
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Eq => "==",
            Comparison::Ne => "!=",
        };
        f.write_str(op)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalRule {
    pub indicator_1: String,
    pub indicator_2: String,
    pub condition_buy: Comparison,
    pub condition_sell: Comparison,
}

impl SignalRule {
    pub fn is_buy(&self, left: f64, right: f64) -> bool {
        self.condition_buy.apply(left, right)
    }

    pub fn is_sell(&self, left: f64, right: f64) -> bool {
        self.condition_sell.apply(left, right)
    }
}

impl fmt::Display for SignalRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "buy: {a} {buy} {b}, sell: {a} {sell} {b}",
            a = self.indicator_1,
            b = self.indicator_2,
            buy = self.condition_buy,
            sell = self.condition_sell,
        )
    }
}
