/*!
 * Authentication context extractor
 *
 * Responsibility:
 * - give handlers the caller (AuthCtx) the handler chain authenticated
 * - axum wiring lives in core, the type in types
 *
 * Public API:
 * - AuthCtx
 * - AuthCtxExtractor
 */

mod core;
mod types;

pub use self::core::AuthCtxExtractor;
pub use self::types::AuthCtx;
