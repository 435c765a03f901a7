use crate::exit::{CliError, CliResult};

/// Parse a byte size such as `4096`, `32KiB`, `6Gi`, `1.5 GB` or `10m`.
///
/// SI prefixes (`k`, `M`, `G`, `T`, `P`) are powers of 1000, IEC prefixes
/// (`Ki`, `Mi`, `Gi`, `Ti`, `Pi`) powers of 1024. A trailing `B` is optional
/// and case does not matter.
pub fn parse_size(input: &str) -> CliResult<u64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(CliError::usage("size must not be empty"));
    }

    let split = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(trimmed.len());
    let (number, suffix) = trimmed.split_at(split);
    if number.is_empty() {
        return Err(CliError::usage(format!("invalid size: {input}")));
    }
    let multiplier = unit_multiplier(suffix.trim())
        .ok_or_else(|| CliError::usage(format!("unknown size unit in {input}")))?;

    if number.contains('.') {
        let value: f64 = number
            .parse()
            .map_err(|_| CliError::usage(format!("invalid size: {input}")))?;
        let bytes = (value * multiplier as f64).ceil();
        if !bytes.is_finite() || bytes >= u64::MAX as f64 {
            return Err(CliError::usage(format!("size too large: {input}")));
        }
        return Ok(bytes as u64);
    }

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::usage(format!("invalid size: {input}")))?;
    value
        .checked_mul(multiplier)
        .ok_or_else(|| CliError::usage(format!("size too large: {input}")))
}

/// Parse a size that has to address memory, such as a block size.
pub fn parse_usize(input: &str, what: &str) -> CliResult<usize> {
    let bytes = parse_size(input).map_err(|err| CliError::usage(format!("{what}: {err}")))?;
    usize::try_from(bytes)
        .map_err(|_| CliError::usage(format!("{what}: {input} does not fit in memory")))
}

fn unit_multiplier(suffix: &str) -> Option<u64> {
    let lower = suffix.to_ascii_lowercase();
    let unit = lower.strip_suffix('b').unwrap_or(&lower);
    let (prefix, base) = match unit.strip_suffix('i') {
        Some(prefix) if !prefix.is_empty() => (prefix, 1024u64),
        Some(_) => return None,
        None => (unit, 1000u64),
    };
    let exp = match prefix {
        "" => 0,
        "k" => 1,
        "m" => 2,
        "g" => 3,
        "t" => 4,
        "p" => 5,
        _ => return None,
    };
    Some(base.pow(exp))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_bytes() {
        assert_eq!(parse_size("4096").unwrap(), 4096);
        assert_eq!(parse_size("12B").unwrap(), 12);
        assert_eq!(parse_size(" 7 ").unwrap(), 7);
    }

    #[test]
    fn si_and_iec_prefixes() {
        assert_eq!(parse_size("32kiB").unwrap(), 32 * 1024);
        assert_eq!(parse_size("32KB").unwrap(), 32_000);
        assert_eq!(parse_size("6Gi").unwrap(), 6 * 1024 * 1024 * 1024);
        assert_eq!(parse_size("1MiB").unwrap(), 1024 * 1024);
        assert_eq!(parse_size("10m").unwrap(), 10_000_000);
        assert_eq!(parse_size("2 TiB").unwrap(), 2 * 1024u64.pow(4));
    }

    #[test]
    fn fractional_values_round_up() {
        assert_eq!(parse_size("1.5GB").unwrap(), 1_500_000_000);
        assert_eq!(parse_size("0.5KiB").unwrap(), 512);
        assert_eq!(parse_size("1.0001k").unwrap(), 1001);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_size("").is_err());
        assert!(parse_size("MiB").is_err());
        assert!(parse_size("12 parsecs").is_err());
        assert!(parse_size("1iB").is_err());
        assert!(parse_size("-3k").is_err());
        assert!(parse_size("1.2.3M").is_err());
    }

    #[test]
    fn rejects_overflow() {
        assert!(parse_size("20000000PiB").is_err());
        assert!(parse_size("99999999999999999999").is_err());
    }

    #[test]
    fn usize_sizes_name_the_flag() {
        let err = parse_usize("nope", "block size").unwrap_err();
        assert!(err.message.starts_with("block size: "));
        assert_eq!(parse_usize("4Ki", "block size").unwrap(), 4096);
    }
}
