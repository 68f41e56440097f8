#![no_main]

use libfuzzer_sys::fuzz_target;
use bcschema::decode::Source;
use bcschema::string::{take_octets, BitString, StringKind};
use bcschema::{Mode, Tag};

const KINDS: [StringKind; 6] = [
    StringKind::Utf8, StringKind::Numeric, StringKind::Printable,
    StringKind::Ia5, StringKind::Visible, StringKind::Bmp,
];

fuzz_target!(|data: &[u8]| {
    for mode in [Mode::Ber, Mode::Cer, Mode::Der] {
        let mut source = Source::new(data.to_vec(), mode);
        if let Ok(bits) = BitString::take_from(&mut source, Tag::BIT_STRING) {
            assert!(bits.unused() < 8);
            assert!(bits.octet_len() > 0 || bits.unused() == 0);
        }

        let mut source = Source::new(data.to_vec(), mode);
        let _ = take_octets(&mut source, Tag::OCTET_STRING);

        for kind in KINDS {
            let mut source = Source::new(data.to_vec(), mode);
            if let Ok(octets) = take_octets(&mut source, kind.tag()) {
                let _ = kind.decode(&octets);
            }
        }
    }
});
