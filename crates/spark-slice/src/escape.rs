//! 字节序列的可逆调试文本。
//!
//! # 格式（What）
//! - `0x20..=0x7E` 中除 `<` 以外的可打印 ASCII 原样输出；
//! - 其余字节（含 `<` 本身）输出为 `<XX>`，`XX` 为两位大写十六进制；
//! - 截断形式在末尾追加 [`TRUNCATION_MARKER`]，截断后的文本不再可还原。
//!
//! 还原只接受规范形式：小写十六进制、本可原样输出的字节被写成 `<XX>`、出现非可打印字符，
//! 都视为格式错误。这样 `escape(unescape(t)) == t` 对任何可还原的 `t` 成立。

use crate::error::{Result, SliceError, codes};
use crate::slice::Slice;

/// 截断标记，不属于转义字母表，因此不可能与真实内容混淆。
pub const TRUNCATION_MARKER: &str = "[…]";

const HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

#[inline]
fn is_verbatim(byte: u8) -> bool {
    (0x20..=0x7E).contains(&byte) && byte != b'<'
}

fn escape_into(bytes: &[u8], out: &mut String) {
    for &byte in bytes {
        if is_verbatim(byte) {
            out.push(byte as char);
        } else {
            out.push('<');
            out.push(HEX_UPPER[(byte >> 4) as usize] as char);
            out.push(HEX_UPPER[(byte & 0x0F) as usize] as char);
            out.push('>');
        }
    }
}

pub(crate) fn escape(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    escape_into(bytes, &mut out);
    out
}

pub(crate) fn escape_truncated(bytes: &[u8], max_bytes: usize) -> String {
    if bytes.len() <= max_bytes {
        return escape(bytes);
    }
    let mut out = String::with_capacity(max_bytes + TRUNCATION_MARKER.len());
    escape_into(&bytes[..max_bytes], &mut out);
    out.push_str(TRUNCATION_MARKER);
    out
}

fn hex_digit(raw: u8) -> Option<u8> {
    match raw {
        b'0'..=b'9' => Some(raw - b'0'),
        b'A'..=b'F' => Some(raw - b'A' + 10),
        _ => None,
    }
}

fn malformed(position: usize, reason: &str) -> SliceError {
    SliceError::format(
        codes::MALFORMED_ESCAPE,
        format!("转义文本在第 {position} 个字符处非法：{reason}"),
    )
}

pub(crate) fn unescape(text: &str) -> Result<Slice> {
    let raw = text.as_bytes();
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        let byte = raw[i];
        if byte == b'<' {
            if i + 4 > raw.len() || raw[i + 3] != b'>' {
                return Err(malformed(i, "`<` 之后缺少完整的 `<XX>` 记号"));
            }
            let (Some(high), Some(low)) = (hex_digit(raw[i + 1]), hex_digit(raw[i + 2])) else {
                return Err(malformed(i, "记号必须是两位大写十六进制"));
            };
            let value = (high << 4) | low;
            if is_verbatim(value) {
                return Err(malformed(i, "可打印字符不应被转义"));
            }
            out.push(value);
            i += 4;
        } else if is_verbatim(byte) {
            out.push(byte);
            i += 1;
        } else {
            return Err(malformed(i, "出现了未转义的非可打印字符"));
        }
    }
    Ok(Slice::wrap(out))
}
