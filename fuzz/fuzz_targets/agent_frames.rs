#![no_main]

use libfuzzer_sys::fuzz_target;
use ssh_agent_keys::proto::{Request, Response};
use ssh_encoding::{Decode, Encode};

fuzz_target!(|data: &[u8]| {
    if let Ok(request) = Request::decode(&mut &data[..]) {
        let mut out = vec![];
        if request.encode(&mut out).is_ok() {
            let _ = Request::decode(&mut &out[..]);
        }
    }
    let _ = Response::decode(&mut &data[..]);
});
