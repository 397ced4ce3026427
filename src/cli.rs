use std::path::PathBuf;

use anyhow::{Result, anyhow};

/// Value of `--name value` or `--name=value`; blank values count as absent.
pub fn flag_value(args: &[String], name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&prefix) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() && !next.starts_with("--") {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}

pub fn path_flag(args: &[String], name: &str) -> Option<PathBuf> {
    flag_value(args, name).map(PathBuf::from)
}

pub fn required_path(args: &[String], name: &str) -> Result<PathBuf> {
    path_flag(args, name).ok_or_else(|| anyhow!("missing required flag {name}"))
}

pub fn usize_flag(args: &[String], name: &str) -> Result<Option<usize>> {
    match flag_value(args, name) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<usize>()
            .map(Some)
            .map_err(|_| anyhow!("{name} expects a non-negative integer, got {raw:?}")),
    }
}

pub fn has_flag(args: &[String], name: &str) -> bool {
    args.iter().any(|a| a == name)
}
