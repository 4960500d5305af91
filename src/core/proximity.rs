/// Returned when either postal code is missing
pub const MISSING_POSTAL_CODE: u32 = 1000;

/// Same two-character prefix
pub const SAME_METRO_REGION: u32 = 50;

/// Same leading character
pub const SAME_MACRO_REGION: u32 = 200;

/// No shared prefix
pub const DIFFERENT_REGION: u32 = 500;

/// Estimate how close two postal codes are without any geodata
///
/// The result is ordinal: smaller is closer. It is only meant for sorting
/// and must never be shown to a user as a distance.
///
/// Rules, in order:
/// - either code absent (or blank): [`MISSING_POSTAL_CODE`]
/// - identical codes: 0
/// - same 3-character prefix: absolute numeric difference of the codes
/// - same 2-character prefix: [`SAME_METRO_REGION`]
/// - same first character: [`SAME_MACRO_REGION`]
/// - otherwise: [`DIFFERENT_REGION`]
pub fn estimate_distance(a: Option<&str>, b: Option<&str>) -> u32 {
    let (a, b) = match (a.map(str::trim), b.map(str::trim)) {
        (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => (a, b),
        _ => return MISSING_POSTAL_CODE,
    };

    if a == b {
        return 0;
    }

    if shares_prefix(a, b, 3) {
        return numeric_gap(a, b).unwrap_or(SAME_METRO_REGION);
    }

    if shares_prefix(a, b, 2) {
        return SAME_METRO_REGION;
    }

    if shares_prefix(a, b, 1) {
        return SAME_MACRO_REGION;
    }

    DIFFERENT_REGION
}

#[inline]
fn shares_prefix(a: &str, b: &str, len: usize) -> bool {
    match (a.get(..len), b.get(..len)) {
        (Some(pa), Some(pb)) => pa == pb,
        _ => false,
    }
}

/// Difference of the leading digits of each code (ZIP+4 suffixes are ignored)
fn numeric_gap(a: &str, b: &str) -> Option<u32> {
    let leading = |code: &str| -> Option<u64> {
        let digits: String = code.chars().take_while(|c| c.is_ascii_digit()).collect();
        digits.parse().ok()
    };
    let gap = leading(a)?.abs_diff(leading(b)?);
    Some(u32::try_from(gap).unwrap_or(u32::MAX))
}
