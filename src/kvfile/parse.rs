use std::path::Path;

use crate::SvnConfigError;

/// How the numeric token of a `K <len>` / `V <len>` header is interpreted.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LengthPolicy {
    /// Radix-aware parsing: `0x`/`0X`/`#` prefix is hexadecimal, a leading
    /// `0` followed by more digits is octal, anything else is decimal.
    ///
    /// Note that `010` therefore means 8, not 10.
    #[default]
    Lenient,
    /// Plain decimal digits only.
    Strict,
}

/// The policy used when decoding credential-cache files.
///
/// Files written by other Subversion clients are read with radix-aware length
/// parsing; this crate itself only ever writes decimal lengths.
pub const LENIENT_LENGTH_PARSE: LengthPolicy = LengthPolicy::Lenient;

/// Parses a header length token according to `policy`.
pub fn decode_length(token: &str, policy: LengthPolicy) -> Option<usize> {
    match policy {
        LengthPolicy::Strict => {
            if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            token.parse::<usize>().ok()
        }
        LengthPolicy::Lenient => {
            let unsigned = token.strip_prefix('+').unwrap_or(token);
            let (digits, radix) = if let Some(hex) = unsigned
                .strip_prefix("0x")
                .or_else(|| unsigned.strip_prefix("0X"))
                .or_else(|| unsigned.strip_prefix('#'))
            {
                (hex, 16)
            } else if unsigned.len() > 1 && unsigned.starts_with('0') {
                (&unsigned[1..], 8)
            } else {
                (unsigned, 10)
            };
            if digits.is_empty() || digits.starts_with(['+', '-']) {
                return None;
            }
            usize::from_str_radix(digits, radix).ok()
        }
    }
}

/// Decodes the records of a credential-cache file.
///
/// Running out of input before the `END` line is a clean end of file only
/// when no record has been decoded yet; otherwise the file is reported as
/// [`SvnConfigError::Corrupt`].
pub(crate) fn decode_records(
    path: &Path,
    data: &[u8],
    policy: LengthPolicy,
) -> Result<Vec<(String, Vec<u8>)>, SvnConfigError> {
    let mut reader = RecordReader {
        path,
        data,
        pos: 0,
        policy,
    };
    let mut records = Vec::new();

    loop {
        match reader.next_record() {
            Ok(Some(Some(record))) => records.push(record),
            Ok(Some(None)) => return Ok(records),
            Ok(None) => {
                if records.is_empty() {
                    return Ok(records);
                }
                return Err(SvnConfigError::Corrupt {
                    path: path.to_path_buf(),
                });
            }
            Err(err) => return Err(err),
        }
    }
}

struct RecordReader<'a> {
    path: &'a Path,
    data: &'a [u8],
    pos: usize,
    policy: LengthPolicy,
}

// Every reader step returns `Ok(None)` when the input runs out.
impl RecordReader<'_> {
    /// `Some(None)` is the `END` sentinel, `Some(Some(..))` a decoded record.
    #[allow(clippy::type_complexity)]
    fn next_record(&mut self) -> Result<Option<Option<(String, Vec<u8>)>>, SvnConfigError> {
        let Some(peek) = self.data.get(self.pos..self.pos + 3) else {
            return Ok(None);
        };
        if peek == b"END" {
            return Ok(Some(None));
        }

        let Some(name_len) = self.read_header(b'K')? else {
            return Ok(None);
        };
        let Some(name) = self.read_field(name_len) else {
            return Ok(None);
        };
        let name = String::from_utf8(name.to_vec()).map_err(|_| self.malformed("non-utf8 key"))?;

        let Some(value_len) = self.read_header(b'V')? else {
            return Ok(None);
        };
        let Some(value) = self.read_field(value_len) else {
            return Ok(None);
        };
        Ok(Some(Some((name, value.to_vec()))))
    }

    fn read_header(&mut self, tag: u8) -> Result<Option<usize>, SvnConfigError> {
        let Some(prefix) = self.data.get(self.pos..self.pos + 2) else {
            return Ok(None);
        };
        if prefix[0] != tag || prefix[1] != b' ' {
            return Err(self.malformed(format!("expected '{} <len>' header", tag as char)));
        }
        let start = self.pos + 2;
        let Some(nl) = self.data[start..].iter().position(|b| *b == b'\n') else {
            return Ok(None);
        };
        let token = String::from_utf8_lossy(&self.data[start..start + nl]).into_owned();
        self.pos = start + nl + 1;

        decode_length(&token, self.policy)
            .map(Some)
            .ok_or_else(|| SvnConfigError::InvalidLength {
                path: self.path.to_path_buf(),
                token,
            })
    }

    /// Reads `len` bytes followed by a single terminator byte.
    fn read_field(&mut self, len: usize) -> Option<&[u8]> {
        let end = self.pos.checked_add(len)?;
        if end >= self.data.len() {
            return None;
        }
        let field = &self.data[self.pos..end];
        self.pos = end + 1;
        Some(field)
    }

    fn malformed(&self, message: impl Into<String>) -> SvnConfigError {
        SvnConfigError::Malformed {
            path: self.path.to_path_buf(),
            message: message.into(),
        }
    }
}
