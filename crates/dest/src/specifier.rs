//! Destination specifier grammar
//!
//! A specifier is a comma-separated list of fields. `key=value` fields set
//! options, bare words are flags:
//!
//! ```text
//! type=fifo,id=/tmp/myfifo,nonblocking,bufsize=102400,create
//! ```

use std::collections::HashMap;

use contracts::{ContractError, DestSpec, DestType};

/// Parse a specifier string into a [`DestSpec`]
///
/// # Errors
/// Unknown keys or flags, malformed values, conflicting duplicate keys, or a
/// missing `type`/`id`.
pub fn parse(s: &str) -> Result<DestSpec, ContractError> {
    let mut parser = SpecParser::default();

    for field in s.split(',') {
        parser.parse_field(field).map_err(|message| {
            ContractError::dest_parse(s, format!("parse failure: field=[{field}]: {message}"))
        })?;
    }

    parser.finish().map_err(|message| ContractError::dest_parse(s, message))
}

#[derive(Default)]
struct SpecParser {
    dest_type: Option<DestType>,
    id: Option<String>,
    perm: Option<u32>,
    args: Vec<String>,
    bufsize: usize,
    nonblocking: bool,
    create: bool,
    append: bool,
    key_vals: HashMap<String, String>,
}

impl SpecParser {
    fn parse_field(&mut self, field: &str) -> Result<(), String> {
        match field.split_once('=') {
            Some((key, value)) => self.parse_key_val(key, value),
            None => self.parse_flag(field),
        }
    }

    fn parse_key_val(&mut self, key: &str, value: &str) -> Result<(), String> {
        // The same key may repeat only with the same value.
        if let Some(prev) = self.key_vals.get(key) {
            if prev != value {
                return Err(format!(
                    "duplicate keyval: key={key} val1={prev} val2={value}"
                ));
            }
        }
        self.key_vals.insert(key.to_string(), value.to_string());

        match key {
            "type" => self.dest_type = Some(value.parse()?),
            "id" => self.id = Some(value.to_string()),
            "perm" => {
                let perm = parse_uint_auto(value).map_err(|e| format!("invalid perm: {e}"))?;
                self.perm = Some(perm);
            }
            "args" => self.args = value.split_whitespace().map(str::to_string).collect(),
            "bufsize" => {
                self.bufsize = value
                    .parse()
                    .map_err(|e| format!("invalid bufsize: {e}"))?;
            }
            _ => return Err(format!("unrecognized key: {key}")),
        }
        Ok(())
    }

    fn parse_flag(&mut self, field: &str) -> Result<(), String> {
        match field {
            "nonblocking" => self.nonblocking = true,
            "create" => self.create = true,
            "append" => self.append = true,
            _ => return Err("unrecognized field".to_string()),
        }
        Ok(())
    }

    fn finish(self) -> Result<DestSpec, String> {
        let dest_type = self.dest_type.ok_or("missing 'type' field")?;
        let id = self
            .id
            .filter(|id| !id.is_empty())
            .ok_or("missing 'id' field")?;

        let mut spec = DestSpec::new(dest_type, id);
        if let Some(perm) = self.perm {
            spec.perm = perm;
        }
        spec.args = self.args;
        spec.bufsize = self.bufsize;
        spec.nonblocking = self.nonblocking;
        spec.create = self.create;
        spec.append = self.append;
        Ok(spec)
    }
}

/// Parse an unsigned integer, inferring the base from its prefix
///
/// `0x` hex, `0o` or a bare leading `0` octal, `0b` binary, else decimal.
fn parse_uint_auto(s: &str) -> Result<u32, std::num::ParseIntError> {
    let lower = s.to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix("0x") {
        u32::from_str_radix(hex, 16)
    } else if let Some(oct) = lower.strip_prefix("0o") {
        u32::from_str_radix(oct, 8)
    } else if let Some(bin) = lower.strip_prefix("0b") {
        u32::from_str_radix(bin, 2)
    } else if lower.len() > 1 && lower.starts_with('0') {
        u32::from_str_radix(&lower[1..], 8)
    } else {
        lower.parse()
    }
}
