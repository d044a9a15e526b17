pub mod geocode;
pub mod storage;
