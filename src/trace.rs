//! バスアクセストレース
//!
//! 1行1アクセスのテキスト形式:
//! ```text
//! # コメント
//! R C0E9        ; 読み取り
//! W $C0ED 0xD5  ; 書き込み
//! ```
//! 数値は16進（`$`/`0x` 接頭辞は任意）。`#` と `;` 以降はコメント。

use crate::bus::MemoryBus;
use crate::error::{DiskError, Result};

/// 1回のバスアクセス
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Access {
    pub address: u16,
    /// `None` = 読み取り
    pub value: Option<u8>,
}

type RadixParser<T> = fn(&str, u32) -> std::result::Result<T, std::num::ParseIntError>;

fn parse_hex<T>(text: &str, line: usize, parse: RadixParser<T>) -> Result<T> {
    let digits = text
        .strip_prefix('$')
        .or_else(|| text.strip_prefix("0x"))
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    parse(digits, 16).map_err(|e| DiskError::Trace {
        line,
        message: format!("bad hex value '{}': {}", text, e),
    })
}

/// トレース1行を解析（空行/コメント行は `None`）
pub fn parse_line(text: &str, line: usize) -> Result<Option<Access>> {
    let body = text.split(['#', ';']).next().unwrap_or("").trim();
    if body.is_empty() {
        return Ok(None);
    }
    let fields: Vec<&str> = body.split_whitespace().collect();
    let access = match fields.as_slice() {
        [op, addr] if op.eq_ignore_ascii_case("r") => Access {
            address: parse_hex(addr, line, u16::from_str_radix)?,
            value: None,
        },
        [op, addr, value] if op.eq_ignore_ascii_case("w") => Access {
            address: parse_hex(addr, line, u16::from_str_radix)?,
            value: Some(parse_hex(value, line, u8::from_str_radix)?),
        },
        _ => {
            return Err(DiskError::Trace {
                line,
                message: format!("expected 'R <addr>' or 'W <addr> <value>', got '{}'", body),
            })
        }
    };
    Ok(Some(access))
}

/// トレース全体を解析
pub fn parse_trace(text: &str) -> Result<Vec<Access>> {
    let mut accesses = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if let Some(access) = parse_line(line, i + 1)? {
            accesses.push(access);
        }
    }
    Ok(accesses)
}

/// トレースをバスに流し、読み取り結果を返す（書き込みは `None`）
pub fn replay<B: MemoryBus>(bus: &mut B, accesses: &[Access]) -> Vec<Option<u8>> {
    accesses
        .iter()
        .map(|a| match a.value {
            Some(v) => {
                bus.write(a.address, v);
                None
            }
            None => Some(bus.read(a.address)),
        })
        .collect()
}
