//! Human-readable byte sizes for command-line arguments.
//!
//! Accepts a plain byte count or a number with a binary suffix: `K`, `M`, `G`
//! (optionally followed by `iB` or `B`, any case). `8M` and `8MiB` are both 8 MiB.

use anyhow::{Context, Result, bail};

/// Parse a size such as `4096`, `64K` or `2GiB` into bytes.
pub fn parse_size(spec: &str) -> Result<u64> {
    let spec = spec.trim();
    let digits = spec.find(|c: char| !c.is_ascii_digit()).unwrap_or(spec.len());
    if digits == 0 {
        bail!("size '{spec}' does not start with a number");
    }
    let value: u64 = spec[..digits]
        .parse()
        .with_context(|| format!("size '{spec}' is out of range"))?;

    let shift = match spec[digits..].to_ascii_lowercase().as_str() {
        "" | "b" => 0,
        "k" | "kb" | "kib" => 10,
        "m" | "mb" | "mib" => 20,
        "g" | "gb" | "gib" => 30,
        other => bail!("unknown size suffix '{other}'"),
    };
    value
        .checked_mul(1 << shift)
        .with_context(|| format!("size '{spec}' is out of range"))
}
