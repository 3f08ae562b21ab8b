pub mod selectors;
pub mod session;
pub mod storage;
pub mod surface;

pub use selectors::Selectors;
pub use session::{BrowserConfig, BrowserKind, new_session};
pub use storage::LocalStorageStore;
pub use surface::DomSurface;
