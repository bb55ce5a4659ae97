//! Authorization module - declarations, resolver and request guard
//!
//! Routes declare what they need with [`Metadata`]:
//! - `require_permission` attaches a (possibly partial) `resource`/`scope` pair
//! - `mark_public` exempts the route from authorization
//!
//! Declarations can be made on a route group and on each handler. The
//! resolver combines both into one effective permission, which the guard
//! sends to the external provider as `resource#scope`. Anything that cannot
//! be resolved, or that the provider does not explicitly grant, is denied.

mod guard;
mod metadata;
mod resolver;
mod routing;

pub use guard::{AuthorizationDecision, AuthorizationGuard, DenyReason, IncomingCredential};
pub use metadata::{Metadata, Permission, PermissionRequirement, Resource, Scope};
pub use resolver::{resolve, ResolvedOutcome};
pub use routing::{RouteEntry, RouteGroup, RouteMetadata};
