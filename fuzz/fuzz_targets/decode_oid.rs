#![no_main]

use libfuzzer_sys::fuzz_target;
use bcschema::decode::Source;
use bcschema::{Mode, Oid, Tag};

fuzz_target!(|data: &[u8]| {
    let mut source = Source::new(data.to_vec(), Mode::Ber);
    let Ok(prim) = source.take_primitive(Tag::OID) else { return };
    let Ok(oid) = Oid::from_primitive(prim) else { return };
    assert!(oid.iter().count() >= 2);
    let _ = oid.to_string();
});
