#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use spark_slice::{Slice, SliceReader};

/// Fuzz 用例：任意输入字节加一串读取指令。
///
/// - **Why**：读取器直接面对网络与磁盘上的不可信数据，任何越界或 panic 都是安全事故；
/// - **How**：按指令依次调用各类读取方法，失败的读取不得移动游标，成功的读取不得越过末尾；
/// - **What**：Fuzzer 自动组合截断、畸形 varint、未终止字节串等输入。
#[derive(Debug, Arbitrary)]
struct ReaderFuzzCase {
    input: Vec<u8>,
    ops: Vec<ReadOp>,
}

#[derive(Debug, Arbitrary)]
enum ReadOp {
    Byte,
    U16Le,
    U32Be,
    U24Le,
    U64Be,
    Var16,
    Var32,
    Var64,
    VarBytes,
    VarStr,
    ByteString,
    Bytes(u16),
    Skip(u16),
    Seek(u16),
    Peek,
}

fuzz_target!(|case: ReaderFuzzCase| {
    let source = Slice::wrap(case.input);
    let mut reader = SliceReader::new(source.clone());
    for op in case.ops {
        let before = reader.position();
        let ok = match op {
            ReadOp::Byte => reader.read_byte().is_ok(),
            ReadOp::U16Le => reader.read_le::<u16>().is_ok(),
            ReadOp::U32Be => reader.read_be::<u32>().is_ok(),
            ReadOp::U24Le => reader.read_u24_le().is_ok(),
            ReadOp::U64Be => reader.read_be::<u64>().is_ok(),
            ReadOp::Var16 => reader.read_varint::<u16>().is_ok(),
            ReadOp::Var32 => reader.read_varint::<u32>().is_ok(),
            ReadOp::Var64 => reader.read_varint::<u64>().is_ok(),
            ReadOp::VarBytes => reader.read_var_bytes().is_ok(),
            ReadOp::VarStr => reader.read_var_str().is_ok(),
            ReadOp::ByteString => match reader.read_byte_string() {
                Ok(decoded) => {
                    assert!(decoded.len() < reader.position() - before);
                    true
                }
                Err(_) => false,
            },
            ReadOp::Bytes(n) => match reader.read_bytes(usize::from(n)) {
                Ok(bytes) => {
                    assert_eq!(bytes.as_bytes(), &source[before..before + usize::from(n)]);
                    true
                }
                Err(_) => false,
            },
            ReadOp::Skip(n) => reader.skip(usize::from(n)).is_ok(),
            ReadOp::Seek(at) => reader.set_position(usize::from(at)).is_ok(),
            ReadOp::Peek => reader.try_peek().is_some(),
        };
        if !ok {
            assert_eq!(reader.position(), before, "失败的读取移动了游标");
        }
        assert!(reader.position() <= source.len());
        assert_eq!(reader.remaining(), source.len() - reader.position());
    }
});
