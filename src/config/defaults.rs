//! System-wide default constants.
//!
//! Centralises magic numbers that would otherwise be scattered across the
//! codebase. Grouped by subsystem for easy discovery.

// ============================================================================
// Panic deduplication
// ============================================================================

/// Minimum gap between accepted panic alerts for one device (milliseconds).
///
/// A physical button press retransmits the same uplink several times at the
/// radio layer; anything inside this window with an unchanged frame count is
/// a duplicate.
pub const PANIC_DEDUP_WINDOW_MS: i64 = 30_000;

/// Sentinel stored when a panic uplink carried no frame count.
///
/// Distinct from any real counter value so two counter-less panics inside
/// the window still deduplicate on time.
pub const MISSING_FRAME_COUNT: i64 = -1;

// ============================================================================
// Recipient address normalization
// ============================================================================

/// Country calling code assumed for bare local numbers.
pub const DEFAULT_COUNTRY_CODE: &str = "57";

/// Length of a national-format mobile number without country code.
pub const LOCAL_NUMBER_LEN: usize = 10;

/// Leading digit of Colombian mobile numbers in national format.
pub const LOCAL_MOBILE_PREFIX: char = '3';

/// Minimum digit count for a number already carrying the country code.
pub const PREFIXED_NUMBER_MIN_LEN: usize = 12;

// ============================================================================
// Formatting
// ============================================================================

/// Bogotá is UTC−5 year-round (Colombia has observed no DST since 1993).
pub const BOGOTA_UTC_OFFSET_SECS: i32 = -5 * 3600;

// ============================================================================
// HTTP
// ============================================================================

/// Default bind address when neither `--addr` nor `PORT` is set.
pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:8080";

/// Maximum accepted webhook body size (bytes).
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// How many characters of the raw uplink JSON to echo into the debug log.
pub const RAW_LOG_MAX_CHARS: usize = 4_000;

// ============================================================================
// Transport
// ============================================================================

/// HTTP client timeout for Twilio requests (seconds).
pub const TRANSPORT_TIMEOUT_SECS: u64 = 30;
