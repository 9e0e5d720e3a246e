//! Page store implementations.

mod fixture;
mod memory;

pub use fixture::{FixtureContent, FixturePage, SiteFixture};
pub use memory::MemoryPageStore;
