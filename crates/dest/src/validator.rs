//! Destination and config validation
//!
//! Rules:
//! - id is non-empty
//! - fd ids are non-negative integers
//! - perm fits in the permission bits (<= 0o7777)
//! - args only apply to proc
//! - append only applies to file, create to file and fifo
//! - nonblocking and bufsize do not apply to proc
//! - buffer_size > 0

use contracts::{ContractError, DestSpec, DestType, RexConfig};

/// Validate one destination
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(spec: &DestSpec) -> Result<(), ContractError> {
    validate_id(spec)?;
    validate_perm(spec)?;
    validate_options(spec)?;
    Ok(())
}

/// Validate a whole config file
pub fn validate_config(config: &RexConfig) -> Result<(), ContractError> {
    if config.buffer_size == 0 {
        return Err(ContractError::config_validation(
            "buffer_size",
            "buffer_size must be > 0",
        ));
    }

    for (idx, spec) in config.destinations.iter().enumerate() {
        validate(spec).map_err(|e| {
            ContractError::config_validation(format!("destinations[{idx}]"), e.to_string())
        })?;
    }
    Ok(())
}

fn invalid(spec: &DestSpec, field: &str, message: impl Into<String>) -> ContractError {
    ContractError::dest_validation(spec.to_string(), field, message)
}

fn validate_id(spec: &DestSpec) -> Result<(), ContractError> {
    if spec.id.is_empty() {
        return Err(invalid(spec, "id", "id cannot be empty"));
    }

    if spec.dest_type == DestType::Fd && spec.id.parse::<u32>().is_err() {
        return Err(invalid(
            spec,
            "id",
            format!(
                "file descriptor has invalid id: have={} want=<number>",
                spec.id
            ),
        ));
    }
    Ok(())
}

fn validate_perm(spec: &DestSpec) -> Result<(), ContractError> {
    if spec.perm > 0o7777 {
        return Err(invalid(
            spec,
            "perm",
            format!("perm must be <= 07777, got 0{:o}", spec.perm),
        ));
    }
    Ok(())
}

fn validate_options(spec: &DestSpec) -> Result<(), ContractError> {
    let t = spec.dest_type;

    if !spec.args.is_empty() && t != DestType::Proc {
        return Err(invalid(spec, "args", format!("args not supported for type {t}")));
    }
    if spec.append && t != DestType::File {
        return Err(invalid(spec, "append", format!("append not supported for type {t}")));
    }
    if spec.create && !matches!(t, DestType::File | DestType::Fifo) {
        return Err(invalid(spec, "create", format!("create not supported for type {t}")));
    }
    if t == DestType::Proc {
        if spec.nonblocking {
            return Err(invalid(spec, "nonblocking", "nonblocking not supported for type proc"));
        }
        if spec.bufsize != 0 {
            return Err(invalid(spec, "bufsize", "bufsize not supported for type proc"));
        }
    }
    Ok(())
}
