use crate::chain::{Output, Transaction};
use crate::script;

/// Collects the OP_RETURN payloads of `tx`, in output order.
///
/// An output whose script comes without `hex` contributes its `asm` verbatim.
/// Decoded payloads are kept even when empty.
pub fn scan(tx: &Transaction) -> Vec<String> {
    let Some(vout) = &tx.vout else {
        return Vec::new();
    };
    vout.iter().filter_map(op_return_payload).collect()
}

fn op_return_payload(txo: &Output) -> Option<String> {
    let script = txo.script_pub_key.as_ref()?;
    let asm = script.asm.as_deref()?;
    if !asm.starts_with("OP_RETURN") {
        return None;
    }

    let payload = match &script.hex {
        Some(hex) => script::decode(hex),
        None => asm,
    };
    Some(payload.into())
}
