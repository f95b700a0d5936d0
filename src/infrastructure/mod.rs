pub mod alpaca;
pub mod binance;
pub mod coingecko;
pub mod core;
pub mod mexc;
pub mod persistence;
pub mod static_universe;
pub mod webhook;
pub mod yahoo;

pub use alpaca::AlpacaMarketDataService;
pub use binance::BinanceMarketDataService;
pub use coingecko::CoinGeckoClient;
pub use mexc::MexcMarketDataService;
pub use static_universe::StaticUniverse;
pub use webhook::WebhookNotifier;
pub use yahoo::YahooChartClient;
