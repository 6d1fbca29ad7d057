/*!
 * Request-side types shared by the handler chain
 *
 * Public API:
 * - RequestContext (framework-neutral view of the in-flight request)
 * - IdentitySlot / IdentitySink / RequestScope
 */

mod context;
mod identity;

pub use context::RequestContext;
pub use identity::{IdentitySink, IdentitySlot, RequestScope};
