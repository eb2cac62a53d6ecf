//! `slice_contract` 集成测试：从公开接口验证字节视图的代数性质。
//!
//! # 测试总览（Why）
//! - 视图是所有键值的载体，子区间、比较、拼接与后继计算一旦出错会直接破坏范围扫描的正确性；
//! - 用 `proptest` 覆盖任意字节内容，示例测试固定住对外承诺的具体行为。

use proptest::prelude::*;
use spark_slice::{ErrorKind, MutableSlice, Slice, SplitMode, codes};

fn bytes_strategy(max: usize) -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(any::<u8>(), 0..max)
}

/// 公开示例：负偏移、空哨兵与连接。
#[test]
fn documented_examples_hold() {
    assert_eq!(Slice::wrap(b"ABCDE".to_vec()).substring(-2).unwrap(), Slice::wrap(b"DE".to_vec()));
    assert_eq!(Slice::wrap(Vec::new()), Slice::empty());
    assert_eq!(
        Slice::join(",", &[Slice::from("A"), Slice::from("BB")]).unwrap(),
        Slice::from("A,BB")
    );
}

/// 越界访问报告越界类错误，且错误码稳定。
#[test]
fn out_of_range_is_reported_not_clamped() {
    let s = Slice::from("abc");
    let err = s.substring_len(2, 5).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OutOfRange);
    assert_eq!(err.code(), codes::OUT_OF_RANGE);
    assert!(s.range(2..1).is_err());
    assert!(s.at(-4).is_err());
}

/// 竞技场风格：冻结后的可变视图与原始视图比较一致。
#[test]
fn mutable_views_freeze_into_equal_slices() {
    let mut buf = MutableSlice::zeroed(4).unwrap();
    buf.store_be::<u32>(0, 0x6B65_7921).unwrap();
    assert_eq!(buf, Slice::from("key!"));
    assert_eq!(buf.freeze(), Slice::from("key!"));
}

/// 键前缀转换为范围上界：`[prefix, prefix.increment())` 覆盖所有以 prefix 开头的键。
#[test]
fn increment_builds_range_end() {
    let prefix = Slice::from("user/");
    let end = prefix.increment().unwrap();
    assert_eq!(end, "user0");
    for key in ["user/", "user/a", "user/\u{7f}\u{7f}"] {
        let key = Slice::from(key);
        assert!(prefix <= key && key < end);
    }
    assert!(Slice::from("user0") >= end);
}

proptest! {
    /// `wrap(b).len() == b.len()` 且全长子区间等于自身。
    #[test]
    fn full_range_is_identity(data in bytes_strategy(64)) {
        let s = Slice::wrap(data.clone());
        prop_assert_eq!(s.len(), data.len());
        prop_assert_eq!(s.substring(0).unwrap(), s.clone());
        prop_assert_eq!(s.substring_len(0, s.len()).unwrap(), s.clone());
    }

    /// 拼接满足结合律，且长度相加。
    #[test]
    fn concat_associative(a in bytes_strategy(16), b in bytes_strategy(16), c in bytes_strategy(16)) {
        let (a, b, c) = (Slice::wrap(a), Slice::wrap(b), Slice::wrap(c));
        let ab_c = a.concat(&b).unwrap().concat(&c).unwrap();
        let a_bc = a.concat(&b.concat(&c).unwrap()).unwrap();
        prop_assert_eq!(ab_c.len(), a.len() + b.len() + c.len());
        prop_assert_eq!(ab_c, a_bc);
    }

    /// 同一缓冲上的相邻切分再拼接回原视图，并且不复制。
    #[test]
    fn adjacent_split_concat_is_zero_copy(data in bytes_strategy(64), cut in any::<usize>()) {
        prop_assume!(!data.is_empty());
        let s = Slice::wrap(data);
        let at = cut % s.len();
        prop_assume!(at > 0);
        let joined = s.take(at).unwrap().concat(&s.skip(at).unwrap()).unwrap();
        prop_assert_eq!(&joined, &s);
        prop_assert_eq!(joined.as_ptr(), s.as_ptr());
    }

    /// 比较是无符号字典序，`Hash` 与 `Eq` 一致。
    #[test]
    fn comparison_matches_unsigned_lexicographic(a in bytes_strategy(12), b in bytes_strategy(12)) {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let expected = a.cmp(&b);
        let (sa, sb) = (Slice::wrap(a), Slice::wrap(b));
        prop_assert_eq!(sa.cmp(&sb), expected);
        if sa == sb {
            let mut ha = DefaultHasher::new();
            let mut hb = DefaultHasher::new();
            sa.hash(&mut ha);
            sb.hash(&mut hb);
            prop_assert_eq!(ha.finish(), hb.finish());
        }
    }

    /// 后继严格更大，不以输入为前缀，且大于所有以输入为前缀的序列。
    #[test]
    fn increment_is_tight(data in bytes_strategy(12), suffix in bytes_strategy(6)) {
        let s = Slice::wrap(data.clone());
        match s.increment() {
            Ok(next) => {
                prop_assert!(next > s);
                prop_assert!(!next.starts_with(&data));
                let mut extended = data;
                extended.extend(suffix);
                prop_assert!(Slice::wrap(extended) < next);
            }
            Err(err) => {
                prop_assert!(data.iter().all(|&b| b == 0xFF));
                prop_assert_eq!(err.code(), codes::INCREMENT_OVERFLOW);
            }
        }
    }

    /// 转义文本逐字节可逆，反向也可逆。
    #[test]
    fn escape_round_trips(data in bytes_strategy(96)) {
        let s = Slice::wrap(data);
        let text = s.escape();
        let back = Slice::unescape(&text).unwrap();
        prop_assert_eq!(&back, &s);
        prop_assert_eq!(back.escape(), text);
    }

    /// 切分后以同一分隔符连接得到原内容。
    #[test]
    fn split_then_join_restores(parts in proptest::collection::vec(bytes_strategy(6), 1..6)) {
        let cleaned: Vec<Vec<u8>> = parts
            .into_iter()
            .map(|p| p.into_iter().filter(|&b| b != b'|').collect())
            .collect();
        let joined = Slice::join_iter("|", &cleaned).unwrap();
        let split = joined.split_by("|", SplitMode::KeepEmpty).unwrap();
        prop_assert_eq!(split.len(), cleaned.len());
        let rejoined = Slice::join("|", &split).unwrap();
        prop_assert_eq!(rejoined.as_bytes(), joined.as_bytes());
    }

    /// 公共前缀长度与逐字节比较一致。
    #[test]
    fn common_prefix_matches_naive(a in bytes_strategy(40), b in bytes_strategy(40)) {
        let naive = a.iter().zip(&b).take_while(|(x, y)| x == y).count();
        prop_assert_eq!(Slice::wrap(a).common_prefix_len(&b), naive);
    }
}
