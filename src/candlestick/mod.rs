pub mod assertions;
pub mod outcome;
pub mod test_data;
pub mod timeframe;

pub use assertions::{
    assert_count_within, assert_empty_result, assert_ohlc_ok, assert_sorted_by_t,
    assert_time_in_window_with_alignment, candle_data, extract_result,
};
pub use outcome::{ErrorKind, ErrorOutcome, classify_error_response, expect_error_outcome};
pub use test_data::{CaseInput, DEFAULT_TEST_DATA_FILE, TestData};
pub use timeframe::{FALLBACK_INTERVAL_MS, Timeframe, TimeframeAliases, interval_ms};
