pub mod finnhub;

pub use finnhub::{FinnhubAdapter, FINNHUB_BASE_URL};
