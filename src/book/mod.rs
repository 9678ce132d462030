//! Order-book stream checks: message classifiers, wait helpers and the
//! delta sequence consistency checker.

pub mod classify;
pub mod sequence;
pub mod snapshot;
pub mod wait;

pub use classify::{
    assert_subscribe_ack, is_book_channel, is_level_tuple, payload_channel, payload_data,
    unwrap_payload,
};
pub use sequence::{
    DeltaCheckConfig, RECV_TIMEOUT, SequenceOutcome, UpdateCursor, check_delta_sequence,
    cursor_from_payload, find_consistent_delta,
};
pub use snapshot::{SNAPSHOT_KEYS, assert_book_snapshot, check_subscription_refused};
pub use wait::{wait_first_data, wait_subscribe_ack};
