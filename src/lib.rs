/*
 * Responsibility
 * - Crate root: module tree shared by the binary and the integration tests
 */
pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod request;
pub mod rest;
pub mod services;
pub mod state;
