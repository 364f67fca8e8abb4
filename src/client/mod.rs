pub mod name_resolver;

pub use name_resolver::{HttpNameResolver, NameResolver, StaticNameResolver};
