use sha2::{Digest, Sha256};

/// Hashes script text with line endings normalized, so a checkout with CRLF
/// endings still matches saves made against the LF copy.
pub(crate) fn fingerprint_script(raw: &str) -> String {
    let mut hasher = Sha256::new();
    for line in raw.lines() {
        hasher.update(line.as_bytes());
        hasher.update([b'\n']);
    }
    to_hex_lower(&hasher.finalize())
}

fn to_hex_lower(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}
