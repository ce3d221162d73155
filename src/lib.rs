pub mod alpha;
pub mod cache;
pub mod config;
pub mod countdown;
pub mod engine;
pub mod error;
pub mod event;
pub mod i18n;
pub mod input;
pub mod ledger;
pub mod model;
pub mod probe;
pub mod ranker;
pub mod stability;
pub mod storage;
pub mod trade_matcher;
pub mod ui;
