mod link;
mod route;

pub use link::Link;
pub use route::Route;
