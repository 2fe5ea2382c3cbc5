//! Scheme 值的诊断解码
//!
//! 值是核心拥有的 64 位标记字：第 48..51 位是类型标签，低 48 位是立即数
//! 或堆偏移。宿主从不构造或修改这些值，只在诊断时解码，或者原样传回核心。

use std::fmt;
use thiserror::Error;

const TAG_SHIFT: u32 = 48;
const TAG_MASK: u64 = 0xF;
const PAYLOAD_MASK: u64 = (1 << TAG_SHIFT) - 1;

/// 嵌套 pair 的最大展开深度，环状结构在此截断
pub const MAX_DEPTH: usize = 1024;

/// 不透明的标记字
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SchemeValue(pub u64);

/// 已知类型标签
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueTag {
    Unit,
    Boolean,
    Fixnum,
    Pair,
    String,
    Closure,
    Symbol,
    Unknown(u8),
}

impl ValueTag {
    pub fn from_bits(bits: u8) -> Self {
        match bits {
            1 => ValueTag::Unit,
            2 => ValueTag::Boolean,
            3 => ValueTag::Fixnum,
            4 => ValueTag::Pair,
            5 => ValueTag::String,
            6 => ValueTag::Closure,
            7 => ValueTag::Symbol,
            other => ValueTag::Unknown(other),
        }
    }
}

impl SchemeValue {
    pub const UNIT: SchemeValue = SchemeValue(1 << TAG_SHIFT);

    pub fn from_raw(raw: i64) -> Self {
        SchemeValue(raw as u64)
    }

    /// wasm 边界上的 i64 表示
    pub fn raw(self) -> i64 {
        self.0 as i64
    }

    pub fn tag_bits(self) -> u8 {
        ((self.0 >> TAG_SHIFT) & TAG_MASK) as u8
    }

    pub fn tag(self) -> ValueTag {
        ValueTag::from_bits(self.tag_bits())
    }

    pub fn payload(self) -> u64 {
        self.0 & PAYLOAD_MASK
    }

    /// fixnum 的值（低 32 位，有符号）
    pub fn as_fixnum(self) -> Option<i32> {
        (self.tag() == ValueTag::Fixnum).then_some(self.payload() as u32 as i32)
    }

    pub fn as_bool(self) -> Option<bool> {
        (self.tag() == ValueTag::Boolean).then_some(self.payload() != 0)
    }

    /// 渲染为可读文本，`memory` 是核心线性内存的快照
    pub fn describe(self, memory: &[u8]) -> Result<String, DecodeError> {
        let mut out = String::new();
        Decoder { memory }.write(self, 0, &mut out)?;
        Ok(out)
    }
}

impl fmt::Debug for SchemeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SchemeValue({:?}, {:#x})", self.tag(), self.payload())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("{kind} at {offset:#x} reads past the end of core memory ({memory_size} bytes)")]
    OutOfBounds {
        kind: &'static str,
        offset: u64,
        memory_size: usize,
    },
}

struct Decoder<'m> {
    memory: &'m [u8],
}

impl Decoder<'_> {
    fn bytes(&self, kind: &'static str, offset: u64, len: u64) -> Result<&[u8], DecodeError> {
        let out_of_bounds = || DecodeError::OutOfBounds {
            kind,
            offset,
            memory_size: self.memory.len(),
        };
        let start = usize::try_from(offset).map_err(|_| out_of_bounds())?;
        let len = usize::try_from(len).map_err(|_| out_of_bounds())?;
        let end = start.checked_add(len).ok_or_else(out_of_bounds)?;
        self.memory.get(start..end).ok_or_else(out_of_bounds)
    }

    fn u32_at(&self, kind: &'static str, offset: u64) -> Result<u32, DecodeError> {
        let mut buf = [0; 4];
        buf.copy_from_slice(self.bytes(kind, offset, 4)?);
        Ok(u32::from_le_bytes(buf))
    }

    fn u64_at(&self, kind: &'static str, offset: u64) -> Result<u64, DecodeError> {
        let mut buf = [0; 8];
        buf.copy_from_slice(self.bytes(kind, offset, 8)?);
        Ok(u64::from_le_bytes(buf))
    }

    fn write(&self, value: SchemeValue, depth: usize, out: &mut String) -> Result<(), DecodeError> {
        use std::fmt::Write;

        // 堆引用只取低 32 位，与核心的 32 位线性内存一致
        let payload = value.payload();
        let offset = u64::from(payload as u32);
        match value.tag() {
            ValueTag::Unit => out.push_str("()"),
            ValueTag::Boolean => out.push_str(if payload == 0 { "#f" } else { "#t" }),
            ValueTag::Fixnum => {
                let _ = write!(out, "{}", payload as u32 as i32);
            }
            ValueTag::Pair => {
                if depth >= MAX_DEPTH {
                    out.push_str("...");
                    return Ok(());
                }
                let car = self.u64_at("pair car", offset)?;
                let cdr = self.u64_at("pair cdr", offset + 8)?;
                out.push('(');
                self.write(SchemeValue(car), depth + 1, out)?;
                out.push_str(" . ");
                self.write(SchemeValue(cdr), depth + 1, out)?;
                out.push(')');
            }
            ValueTag::String => {
                let len = self.u32_at("string length", offset)?;
                let bytes = self.bytes("string bytes", offset + 4, u64::from(len))?;
                out.push('"');
                out.push_str(&String::from_utf8_lossy(bytes));
                out.push('"');
            }
            ValueTag::Closure => {
                let index = self.u32_at("closure", offset)?;
                let _ = write!(out, "<closure#{index}>");
            }
            ValueTag::Symbol => {
                let _ = write!(out, "<symbol#{}>", payload as u32);
            }
            ValueTag::Unknown(tag) => {
                let _ = write!(out, "<unknown_type_id: {tag} ,{}>", payload as u32);
            }
        }
        Ok(())
    }
}
