pub mod bar;
pub mod loader;
pub mod panel;

pub use bar::{Bar, BarError};
pub use loader::{filter_by_symbol, load_csv, load_price_panel, CsvPriceProvider, PriceProvider};
pub use panel::{FactorTable, Panel, PricePanel, SignalMask};
