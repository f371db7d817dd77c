mod error;
pub use error::Error;
mod portal_page;
mod record;
pub(crate) mod static_selector;

pub use portal_page::PortalPage;
pub use record::Record;
