//! Fuzzes the wire codec's decode path: arbitrary bytes must either be
//! rejected with a `DecodeError` or parsed into a well-formed message,
//! never panic.

use honggfuzz::fuzz;

fn main() {
    loop {
        fuzz!(|data: &[u8]| {
            let _: Result<smc_messages::MethodSelector, _> = smc_messages::decode(data);
            let _: Result<smc_messages::SetupProposal, _> = smc_messages::decode(data);
            let _: Result<smc_messages::SetupResponse, _> = smc_messages::decode(data);
            let _: Result<smc_messages::Payment, _> = smc_messages::decode(data);
        });
    }
}
