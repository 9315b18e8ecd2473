pub mod coinmarketcap;

pub use coinmarketcap::CmcClient;
