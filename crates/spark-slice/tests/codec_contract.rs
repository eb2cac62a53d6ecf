//! `codec_contract` 集成测试：写入器与读取器的线格式必须逐字节对应。
//!
//! # 测试总览（Why）
//! - 上层协议依赖这里的布局与其它语言的客户端互通，任何偏差都是兼容性事故；
//! - 随机生成字段序列，经写入器编码后由读取器按同一顺序解码，断言值与游标完全一致；
//! - 截断输入上的每一次读取都必须失败且不消费字节。
//!
//! 字节串终止符之后若紧跟 `0xFF` 会被解读为转义零，因此生成的每个字节串后面都补一个分隔字节。

use proptest::prelude::*;
use std::fmt::Debug;

use spark_slice::endian::U24_MAX;
use spark_slice::{
    BigEndian, ByteOrder, FixedWidth, LittleEndian, Slice, SliceReader, SliceWriter, codes, varint,
};

const BYTE_STRING_FENCE: u8 = b';';

#[derive(Debug, Clone)]
enum Field {
    U8(u8),
    U16Le(u16),
    U32Be(u32),
    U24Le(u32),
    I64Le(i64),
    F64Be(f64),
    Var16(u16),
    Var32(u32),
    Var64(u64),
    Bytes(Vec<u8>),
    Text(String),
    ByteString(Vec<u8>),
}

fn field_strategy() -> impl Strategy<Value = Field> {
    prop_oneof![
        any::<u8>().prop_map(Field::U8),
        any::<u16>().prop_map(Field::U16Le),
        any::<u32>().prop_map(Field::U32Be),
        (0u32..=0xFF_FFFF).prop_map(Field::U24Le),
        any::<i64>().prop_map(Field::I64Le),
        any::<f64>().prop_map(Field::F64Be),
        any::<u16>().prop_map(Field::Var16),
        any::<u32>().prop_map(Field::Var32),
        any::<u64>().prop_map(Field::Var64),
        proptest::collection::vec(any::<u8>(), 0..24).prop_map(Field::Bytes),
        ".{0,12}".prop_map(Field::Text),
        proptest::collection::vec(prop_oneof![Just(0u8), Just(0xFF), any::<u8>()], 0..12)
            .prop_map(Field::ByteString),
    ]
}

fn encode(fields: &[Field]) -> Slice {
    let mut writer = SliceWriter::new();
    for field in fields {
        let written = match field {
            Field::U8(v) => writer.write_byte(*v),
            Field::U16Le(v) => writer.write_le(*v),
            Field::U32Be(v) => writer.write_be(*v),
            Field::U24Le(v) => writer.write_u24_le(*v),
            Field::I64Le(v) => writer.write_le(*v),
            Field::F64Be(v) => writer.write_be(*v),
            Field::Var16(v) => writer.write_varint(*v),
            Field::Var32(v) => writer.write_varint(*v),
            Field::Var64(v) => writer.write_varint(*v),
            Field::Bytes(v) => writer.write_var_bytes(v),
            Field::Text(v) => writer.write_var_str(v),
            Field::ByteString(v) => writer
                .write_byte_string(v)
                .and_then(|()| writer.write_byte(BYTE_STRING_FENCE)),
        };
        written.expect("写入不应失败");
    }
    writer.into_slice()
}

fn decode_and_compare(reader: &mut SliceReader, field: &Field) -> Result<(), TestCaseError> {
    match field {
        Field::U8(v) => prop_assert_eq!(reader.read_byte().unwrap(), *v),
        Field::U16Le(v) => prop_assert_eq!(reader.read_le::<u16>().unwrap(), *v),
        Field::U32Be(v) => prop_assert_eq!(reader.read_be::<u32>().unwrap(), *v),
        Field::U24Le(v) => prop_assert_eq!(reader.read_u24_le().unwrap(), *v),
        Field::I64Le(v) => prop_assert_eq!(reader.read_le::<i64>().unwrap(), *v),
        Field::F64Be(v) => {
            prop_assert_eq!(reader.read_be::<f64>().unwrap().to_bits(), v.to_bits())
        }
        Field::Var16(v) => prop_assert_eq!(reader.read_varint::<u16>().unwrap(), *v),
        Field::Var32(v) => prop_assert_eq!(reader.read_varint::<u32>().unwrap(), *v),
        Field::Var64(v) => prop_assert_eq!(reader.read_varint::<u64>().unwrap(), *v),
        Field::Bytes(v) => {
            let bytes = reader.read_var_bytes().unwrap();
            prop_assert_eq!(bytes.as_bytes(), &v[..]);
        }
        Field::Text(v) => {
            let text = reader.read_var_str().unwrap();
            prop_assert_eq!(&text, v);
        }
        Field::ByteString(v) => {
            let bytes = reader.read_byte_string().unwrap();
            prop_assert_eq!(bytes.as_bytes(), &v[..]);
            prop_assert_eq!(reader.read_byte().unwrap(), BYTE_STRING_FENCE);
        }
    }
    Ok(())
}

/// 线格式示例：varint 低位组在前，字节串中的零被转义。
#[test]
fn wire_examples() {
    let mut writer = SliceWriter::new();
    writer.write_varint(300u16).unwrap();
    writer.write_var_bytes(b"ab").unwrap();
    writer.write_byte_string(b"\x00").unwrap();
    assert_eq!(
        writer.as_bytes(),
        &[0xAC, 0x02, 0x02, b'a', b'b', 0x00, 0xFF, 0x00]
    );
    assert_eq!(varint::encoded_len(300), 2);
}

fn round_trip_fixed<O: ByteOrder, T: FixedWidth>(values: &[T]) -> Vec<T> {
    let mut writer = SliceWriter::new();
    for &value in values {
        writer.write_fixed::<O, T>(value).unwrap();
    }
    assert_eq!(writer.position(), values.len() * T::WIDTH);
    let mut reader = SliceReader::new(writer.into_slice());
    let decoded = values
        .iter()
        .map(|_| reader.read_fixed::<O, T>().unwrap())
        .collect();
    assert!(!reader.has_more());
    decoded
}

fn assert_both_orders<T: FixedWidth + PartialEq + Debug>(values: &[T]) {
    assert_eq!(round_trip_fixed::<LittleEndian, T>(values), values);
    assert_eq!(round_trip_fixed::<BigEndian, T>(values), values);
}

/// 每种宽度与字节序在零与极值上往返一致，浮点按位比较（含 NaN 与无穷）。
#[test]
fn fixed_width_extremes_round_trip() {
    assert_both_orders(&[0u8, u8::MAX]);
    assert_both_orders(&[0u16, u16::MAX]);
    assert_both_orders(&[0u32, u32::MAX]);
    assert_both_orders(&[0u64, u64::MAX]);
    assert_both_orders(&[0i16, i16::MIN, i16::MAX, -1]);
    assert_both_orders(&[0i32, i32::MIN, i32::MAX, -1]);
    assert_both_orders(&[0i64, i64::MIN, i64::MAX, -1]);

    let floats32 = [0.0f32, -0.0, f32::MAX, f32::MIN, f32::INFINITY, f32::NEG_INFINITY, f32::NAN];
    let floats64 = [0.0f64, -0.0, f64::MAX, f64::MIN, f64::INFINITY, f64::NEG_INFINITY, f64::NAN];
    let bits32: Vec<u32> = floats32.iter().map(|v| v.to_bits()).collect();
    let bits64: Vec<u64> = floats64.iter().map(|v| v.to_bits()).collect();
    for decoded in [
        round_trip_fixed::<LittleEndian, f32>(&floats32),
        round_trip_fixed::<BigEndian, f32>(&floats32),
    ] {
        let decoded: Vec<u32> = decoded.iter().map(|v| v.to_bits()).collect();
        assert_eq!(decoded, bits32);
    }
    for decoded in [
        round_trip_fixed::<LittleEndian, f64>(&floats64),
        round_trip_fixed::<BigEndian, f64>(&floats64),
    ] {
        let decoded: Vec<u64> = decoded.iter().map(|v| v.to_bits()).collect();
        assert_eq!(decoded, bits64);
    }
}

/// 24 位字段：零与 `0xFF_FFFF` 在两种字节序下往返，超出范围的值被拒绝且不写入。
#[test]
fn u24_extremes_round_trip() {
    let mut writer = SliceWriter::new();
    for value in [0, U24_MAX] {
        writer.write_u24_le(value).unwrap();
        writer.write_u24_be(value).unwrap();
    }
    assert!(writer.write_u24_le(U24_MAX + 1).is_err());
    assert!(writer.write_u24_be(u32::MAX).is_err());
    assert_eq!(writer.position(), 12);

    let mut reader = SliceReader::new(writer.into_slice());
    for value in [0, U24_MAX] {
        assert_eq!(reader.read_u24_le().unwrap(), value);
        assert_eq!(reader.read_u24_be().unwrap(), value);
    }
    assert!(!reader.has_more());
}

/// 极值的字节布局：有符号最小值的符号位分别落在首字节（大端）与末字节（小端）。
#[test]
fn extreme_values_have_expected_layout() {
    let mut writer = SliceWriter::new();
    writer.write_be(i16::MIN).unwrap();
    writer.write_le(i16::MIN).unwrap();
    writer.write_be(u32::MAX).unwrap();
    assert_eq!(
        writer.as_bytes(),
        &[0x80, 0x00, 0x00, 0x80, 0xFF, 0xFF, 0xFF, 0xFF]
    );
}

/// 续位链过长是格式错误，与截断区分开。
#[test]
fn malformed_and_truncated_varints_differ() {
    let mut reader = SliceReader::new(Slice::copy_from(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x01]));
    let err = reader.read_varint::<u32>().unwrap_err();
    assert_eq!(err.code(), codes::MALFORMED_VARINT);
    assert_eq!(reader.position(), 0);

    let mut reader = SliceReader::new(Slice::copy_from(&[0x80, 0x80]));
    assert!(reader.read_varint::<u32>().unwrap_err().is_truncated());
    assert_eq!(reader.position(), 0);
}

/// 占位回填：先写长度占位，正文写完后回填真实长度。
#[test]
fn reserve_and_backfill_frame() {
    let mut writer = SliceWriter::new();
    let length_at = writer.skip(4).unwrap();
    writer.write_var_str("payload").unwrap();
    let body_len = (writer.position() - length_at - 4) as u32;
    writer.patch_be(length_at, body_len).unwrap();

    let mut reader = SliceReader::new(writer.into_slice());
    let len = reader.read_be::<u32>().unwrap() as usize;
    assert_eq!(len, reader.remaining());
    assert_eq!(reader.read_var_str().unwrap(), "payload");
}

proptest! {
    /// 任意字段序列经写入再读取得到相同的值，游标最终停在末尾。
    #[test]
    fn writer_reader_round_trip(fields in proptest::collection::vec(field_strategy(), 0..16)) {
        let encoded = encode(&fields);
        let mut reader = SliceReader::new(encoded.clone());
        for field in &fields {
            decode_and_compare(&mut reader, field)?;
        }
        prop_assert!(!reader.has_more());
        prop_assert_eq!(reader.head(), encoded);
    }

    /// 截断后的输入：每次失败的读取都不消费字节。
    #[test]
    fn truncated_input_never_yields_partial_reads(
        fields in proptest::collection::vec(field_strategy(), 1..8),
        cut in any::<usize>(),
    ) {
        let encoded = encode(&fields);
        prop_assume!(!encoded.is_empty());
        let truncated = encoded.take(cut % encoded.len()).unwrap();
        let mut reader = SliceReader::new(truncated);
        for field in &fields {
            let before = reader.position();
            let failed = match field {
                Field::U8(_) => reader.read_byte().is_err(),
                Field::U16Le(_) => reader.read_le::<u16>().is_err(),
                Field::U32Be(_) => reader.read_be::<u32>().is_err(),
                Field::U24Le(_) => reader.read_u24_le().is_err(),
                Field::I64Le(_) => reader.read_le::<i64>().is_err(),
                Field::F64Be(_) => reader.read_be::<f64>().is_err(),
                Field::Var16(_) => reader.read_varint::<u16>().is_err(),
                Field::Var32(_) => reader.read_varint::<u32>().is_err(),
                Field::Var64(_) => reader.read_varint::<u64>().is_err(),
                Field::Bytes(_) => reader.read_var_bytes().is_err(),
                Field::Text(_) => reader.read_var_str().is_err(),
                Field::ByteString(_) => reader.read_byte_string().is_err(),
            };
            if failed {
                prop_assert_eq!(reader.position(), before);
                break;
            }
        }
    }
}
