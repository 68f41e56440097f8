#![no_main]

use libfuzzer_sys::fuzz_target;
use bcschema::decode::Source;
use bcschema::{Integer, Mode, Tag};

fuzz_target!(|data: &[u8]| {
    let mut source = Source::new(data.to_vec(), Mode::Ber);
    let int = match source.take_primitive(Tag::INTEGER) {
        Ok(prim) => Integer::from_primitive(prim),
        Err(_) => return,
    };
    let Ok(int) = int else { return };

    // Narrow conversions must agree with wide ones.
    if let Some(x) = int.to_i8() {
        assert_eq!(int.to_i64(), Some(i64::from(x)));
    }
    if let Some(x) = int.to_u32() {
        assert_eq!(int.to_u64(), Some(u64::from(x)));
        assert!(!int.is_negative());
    }
    if let Some(x) = int.to_i128() {
        assert!(int.is_in_range(x, x));
    }
    let _ = int.to_i16();
    let _ = int.to_i32();
    let _ = int.to_u8();
    let _ = int.to_u16();
    let _ = int.to_u128();
    let _ = int.to_string();
});
