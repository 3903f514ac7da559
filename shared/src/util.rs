/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a Snowflake-style i64 for use as resource ID.
///
/// Layout (53 bits, fits in JavaScript's Number.MAX_SAFE_INTEGER):
///   - 41 bits: milliseconds since 2024-01-01 UTC (~69 years)
///   - 12 bits: random (4096 values per ms)
///
/// Primary keys carry a UNIQUE constraint, which is the final guard against
/// a same-millisecond collision.
pub fn snowflake_id() -> i64 {
    use rand::Rng;
    // Custom epoch: 2024-01-01 00:00:00 UTC
    const EPOCH_MS: i64 = 1_704_067_200_000;
    let now = now_millis();
    let ts = (now - EPOCH_MS) & 0x1FF_FFFF_FFFF; // 41 bits
    let rand_bits: i64 = rand::thread_rng().gen_range(0..0x1000); // 12 bits
    (ts << 12) | rand_bits
}

/// Random URL-safe alphanumeric token (QR codes, upload names)
pub fn random_token(len: usize) -> String {
    use rand::Rng;
    use rand::distributions::Alphanumeric;
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Largest amount a NUMERIC(12, 2) money column holds: 9_999_999_999.99
pub const MAX_MONEY: rust_decimal::Decimal =
    rust_decimal::Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Largest stock quantity a NUMERIC(14, 3) column holds: 99_999_999_999.999
pub const MAX_QUANTITY: rust_decimal::Decimal =
    rust_decimal::Decimal::from_parts(276_447_231, 23_283, 0, false, 3);

/// Round a money amount to 2 decimal places (half away from zero)
pub fn round_money(value: rust_decimal::Decimal) -> rust_decimal::Decimal {
    value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}
