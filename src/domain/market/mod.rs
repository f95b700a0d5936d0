// Instrument identity and bar data
pub mod asset_class;
pub mod bar;
pub mod symbol;

pub use asset_class::AssetClass;
pub use bar::{Bar, BarSeries, BarWindow};
pub use symbol::{Symbol, SymbolError};
