#![no_main]

use libfuzzer_sys::fuzz_target;
use bcschema::kerberos::KrbError;
use bcschema::schema::Registry;
use bcschema::Mode;

fuzz_target!(|data: &[u8]| {
    let registry = Registry::new();
    for mode in [Mode::Ber, Mode::Cer, Mode::Der] {
        if let Ok(err) = registry.decode::<KrbError>(data.to_vec(), mode) {
            assert!(err.susec.get() <= 999_999);
        }
    }
});
