pub mod identity;
pub mod resolver;

pub use identity::IdentityService;
pub use resolver::IdentityResolver;
