mod cdp_session;
mod chrome_finder;
mod driver;
mod error;
mod host;
mod launcher;
mod profile;
pub mod script;

pub use cdp_session::{CdpDriver, CdpSession};
pub use chrome_finder::ChromeFinder;
pub use driver::{Driver, FrameContext, Locator, WindowHandle};
pub use error::{Error, Result};
pub use host::{BrowserHost, HostOptions};
pub use launcher::{ChromeLauncher, LaunchOptions};
pub use profile::ProfileManager;
