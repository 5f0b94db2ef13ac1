pub mod affordance;
pub mod chrome_driver;
pub mod driver;
pub mod launcher;

pub use affordance::Affordance;
pub use chrome_driver::ChromeDriver;
pub use driver::{Key, SessionLauncher, SurfaceDriver, POLL_INTERVAL};
pub use launcher::ChromeLauncher;
