/// Resolve a `Range` header against a resource of `size` bytes.
///
/// Returns the inclusive byte bounds to serve, or None when the header
/// does not parse as a single `bytes=start-end` range or describes no
/// satisfiable byte. Both bounds are optional on the wire: a missing
/// start means the beginning of the resource and a missing end means its
/// last byte. An end bound past the resource is clamped rather than
/// rejected.
pub(crate) fn byte_range(raw: &str, size: u64) -> Option<(u64, u64)> {
    let (start, end) = parse(raw)?;
    let last = size.checked_sub(1)?;
    let start = start.unwrap_or(0);
    let end = end.unwrap_or(last).min(last);

    if start > end || start >= size {
        return None;
    }

    Some((start, end))
}

fn parse(raw: &str) -> Option<(Option<u64>, Option<u64>)> {
    let spec = raw.strip_prefix("bytes=")?;
    let (start, end) = spec.split_once('-')?;

    let parse_bound = |bound: &str| {
        if bound.is_empty() {
            Some(None)
        } else {
            bound.parse::<u64>().ok().map(Some)
        }
    };

    Some((parse_bound(start)?, parse_bound(end)?))
}

#[cfg(test)]
mod tests {
    use super::byte_range;

    #[test]
    fn satisfiable_ranges() {
        assert_eq!(byte_range("bytes=0-3", 10), Some((0, 3)));
        assert_eq!(byte_range("bytes=4-", 10), Some((4, 9)));
        assert_eq!(byte_range("bytes=-9", 10), Some((0, 9)));
        assert_eq!(byte_range("bytes=-", 10), Some((0, 9)));
        assert_eq!(byte_range("bytes=9-9", 10), Some((9, 9)));
        // an overlong end bound is clamped
        assert_eq!(byte_range("bytes=4-100", 10), Some((4, 9)));
    }

    #[test]
    fn unsatisfiable_ranges() {
        assert_eq!(byte_range("bytes=100-", 10), None);
        assert_eq!(byte_range("bytes=10-", 10), None);
        assert_eq!(byte_range("bytes=5-4", 10), None);
        assert_eq!(byte_range("bytes=0-", 0), None);
    }

    #[test]
    fn malformed_ranges() {
        assert_eq!(byte_range("bites=0-3", 10), None);
        assert_eq!(byte_range("bytes=a-b", 10), None);
        assert_eq!(byte_range("bytes=03", 10), None);
        assert_eq!(byte_range("bytes=0-3,5-7", 10), None);
        assert_eq!(byte_range("0-3", 10), None);
    }
}
