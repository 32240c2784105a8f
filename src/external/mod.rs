pub mod trendlink;
