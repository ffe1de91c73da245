/// Country calling code assumed for bare 10-digit (NANP) numbers.
pub const DEFAULT_COUNTRY_CODE: &str = "1";

/// Trunk prefix that an 11-digit number carries when it already includes the
/// default country code.
const TRUNK_PREFIX: char = '1';

/// Fewer digits than this cannot be dialled and are dropped.
const MIN_DIGITS: usize = 10;

/// Normalize free-form phone text into an E.164-like string for Twenty.
///
/// Heuristic, not validating:
/// - every non-digit is stripped
/// - fewer than 10 digits ⇒ `None` (caller omits the phone entirely)
/// - exactly 10 digits ⇒ `+1` prefix
/// - 11 digits with the `1` trunk prefix ⇒ `+` prefix
/// - anything longer is passed through with a `+` prefix (best effort for
///   international numbers)
///
/// Returns: `Some(normalized)` or `None` when unusable.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();

    if digits.len() < MIN_DIGITS {
        if !digits.is_empty() {
            tracing::debug!("Phone dropped, only {} digits: {}", digits.len(), raw);
        }
        return None;
    }

    if digits.len() == MIN_DIGITS {
        return Some(format!("+{}{}", DEFAULT_COUNTRY_CODE, digits));
    }

    if digits.len() == MIN_DIGITS + 1 && digits.starts_with(TRUNK_PREFIX) {
        return Some(format!("+{}", digits));
    }

    // Country code unknown; trust the digits as given.
    Some(format!("+{}", digits))
}
