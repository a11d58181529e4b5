/// Appends one `K`/`V` record pair to `out`. Lengths are always decimal.
pub(crate) fn encode_record(name: &str, value: &[u8], out: &mut Vec<u8>) {
    out.extend_from_slice(format!("K {}\n", name.len()).as_bytes());
    out.extend_from_slice(name.as_bytes());
    out.push(b'\n');
    out.extend_from_slice(format!("V {}\n", value.len()).as_bytes());
    out.extend_from_slice(value);
    out.push(b'\n');
}

/// Encodes `records` in the given order followed by the `END` line.
pub(crate) fn encode_records<'a>(
    records: impl IntoIterator<Item = (&'a str, &'a [u8])>,
) -> Vec<u8> {
    let mut out = Vec::new();
    for (name, value) in records {
        encode_record(name, value, &mut out);
    }
    out.extend_from_slice(b"END\n");
    out
}
