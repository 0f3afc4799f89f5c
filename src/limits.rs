use rust_decimal::Decimal;

pub const MAX_NAME_LEN: usize = 256;
pub const MAX_DESCRIPTION_LEN: usize = 4096;
pub const MAX_LABEL_LEN: usize = 64;
pub const MAX_STAY_NIGHTS: i64 = 365;
pub const MAX_ROOM_NUMBERS_PER_ROOM_TYPE: usize = 500;
pub const MAX_BLOCKS_PER_ROOM_NUMBER: usize = 10_000;
pub const MAX_FACILITIES: usize = 64;
pub const MAX_IMAGES: usize = 32;

pub fn max_price_per_night() -> Decimal {
    Decimal::from(1_000_000)
}
