pub mod api;
pub mod config;
pub mod pipeline;
pub mod reporter;
pub mod scanner;
pub mod session;
pub mod state;

pub use config::{Config, RelayConfig, ReporterConfig, ScannerConfig, ServerConfig};
pub use reporter::http::HttpReporter;
pub use reporter::memory::MemoryReporter;
pub use reporter::{ReportResponse, Reporter};
pub use scanner::mock::MockScanner;
pub use scanner::tcp::TcpScanner;
pub use scanner::{ScanEvent, Scanner};
pub use session::{Outcome, ScanSession};
pub use state::{RelayState, RelayStats};
