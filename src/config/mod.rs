mod server;

pub use server::{DEFAULT_PAGE_SIZE, FileConfig, ServerConfig};
