/*
 * Responsibility
 * - middleware public interface
 * - jwt_rest (handler chain), scope (per-request sink), http (transport layers)
 */
pub mod http;
pub mod jwt_rest;
pub mod scope;
