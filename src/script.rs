//! OP_RETURN script framing.
//!
//! The node hands scripts out hex-encoded, and the payload stays hex-encoded here:
//!
//! ```text
//! 6a <OP_PUSHBYTES_1..=OP_PUSHBYTES_75> <data>
//! 6a 4c <1-byte length> <data>
//! 6a 4d <2-byte length> <data>
//! 6a 4e <4-byte length> <data>
//! ```

const OP_RETURN: &str = "6a";
const OP_PUSHDATA1: &str = "4c";
const OP_PUSHDATA2: &str = "4d";
const OP_PUSHDATA4: &str = "4e";

/// Strips the OP_RETURN opcode and the push framing from `script_hex`, returning
/// the pushed data still hex-encoded.
///
/// Never fails: a script not starting with OP_RETURN comes back unchanged, and a
/// truncated one yields an empty string.
pub fn decode(script_hex: &str) -> &str {
    let Some(opcode) = script_hex.get(..2) else {
        return script_hex;
    };
    if !opcode.eq_ignore_ascii_case(OP_RETURN) {
        return script_hex;
    }

    let rest = &script_hex[2..];
    if rest.len() < 4 {
        return "";
    }
    let Some(push) = rest.get(..2) else {
        return "";
    };

    // hex chars of the length field following the push opcode
    let length_field = if push.eq_ignore_ascii_case(OP_PUSHDATA1) {
        2
    } else if push.eq_ignore_ascii_case(OP_PUSHDATA2) {
        4
    } else if push.eq_ignore_ascii_case(OP_PUSHDATA4) {
        8
    } else {
        // OP_PUSHBYTES_n: the opcode is the length
        0
    };

    let cursor = 2 + length_field;
    match rest.get(cursor..) {
        Some(data) if !data.is_empty() => data,
        _ => "",
    }
}
