use rand::distributions::Alphanumeric;
use rand::Rng;
use time::OffsetDateTime;

const ID_LEN: usize = 24;

/// Random URL-safe record id.
pub fn new_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_LEN)
        .map(char::from)
        .collect()
}

/// Today's UTC date as `YYYY-MM-DD`.
pub fn today() -> String {
    OffsetDateTime::now_utc().date().to_string()
}
