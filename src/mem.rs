//! Available-memory probe feeding the batch controller's safety guard.

/// Fraction of system memory currently available, in `[0, 1]`.
///
/// Returns `None` on platforms without a probe; callers treat that as
/// "no pressure signal" and rely on the throughput rule alone.
#[cfg(target_os = "linux")]
pub fn available_fraction() -> Option<f64> {
    let info = std::fs::read_to_string("/proc/meminfo").ok()?;
    let mut total_kb = None;
    let mut avail_kb = None;
    for line in info.lines() {
        if let Some(rest) = line.strip_prefix("MemTotal:") {
            total_kb = parse_kb(rest);
        } else if let Some(rest) = line.strip_prefix("MemAvailable:") {
            avail_kb = parse_kb(rest);
        }
        if total_kb.is_some() && avail_kb.is_some() {
            break;
        }
    }
    match (total_kb, avail_kb) {
        (Some(total), Some(avail)) if total > 0 => Some(avail as f64 / total as f64),
        _ => None,
    }
}

#[cfg(not(target_os = "linux"))]
pub fn available_fraction() -> Option<f64> {
    None
}

#[cfg(target_os = "linux")]
fn parse_kb(rest: &str) -> Option<u64> {
    rest.trim().trim_end_matches(" kB").trim().parse().ok()
}

#[cfg(all(test, target_os = "linux"))]
mod tests {
    use super::*;

    #[test]
    fn probe_reports_sane_fraction() {
        let frac = available_fraction().expect("meminfo readable on linux");
        assert!(frac > 0.0 && frac <= 1.0, "fraction out of range: {}", frac);
    }

    #[test]
    fn parse_kb_handles_meminfo_field() {
        assert_eq!(parse_kb("       16384 kB"), Some(16384));
        assert_eq!(parse_kb("garbage"), None);
    }
}
