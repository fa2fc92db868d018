#![no_main]

use libfuzzer_sys::fuzz_target;
use ssh_agent_keys::{key::Key, pem::PemContainer};

fuzz_target!(|data: &[u8]| {
    if let Ok(pem) = PemContainer::parse(data) {
        let _ = Key::from_pem(&pem);
    }
});
