#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use spark_buffer::SliceBuffer;
use spark_slice::Slice;

/// Fuzz 用例：调试转义文本的双向还原，以及竞技场驻留后内容不变。
///
/// - **Why**：转义文本会出现在日志与排障工具里，被人工复制回来再解析，必须逐字节可逆；
///   任意字符串交给 `unescape` 只能返回错误，不能 panic；
/// - **How**：先对任意字节做 `escape`/`unescape` 往返，再把同一段字节驻留进竞技场比较；
/// - **What**：覆盖 `<`、不可打印字节、截断转义等边界。
#[derive(Debug, Arbitrary)]
struct EscapeFuzzCase {
    bytes: Vec<u8>,
    text: String,
    limit: u8,
}

fuzz_target!(|case: EscapeFuzzCase| {
    let slice = Slice::wrap(case.bytes);
    let escaped = slice.escape();
    let restored = Slice::unescape(&escaped).expect("转义文本必须可还原");
    assert_eq!(restored, slice);

    let truncated = slice.escape_truncated(usize::from(case.limit));
    assert!(truncated.len() <= escaped.len() + spark_slice::TRUNCATION_MARKER.len());

    if let Ok(parsed) = Slice::unescape(&case.text) {
        assert_eq!(parsed.escape(), case.text);
    }

    let mut arena = SliceBuffer::new();
    let interned = arena.intern_slice(&slice).expect("驻留不应失败");
    assert_eq!(interned, slice);
});
