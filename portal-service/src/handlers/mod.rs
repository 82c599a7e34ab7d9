//! HTTP handlers for portal-service.

pub mod admin;
pub mod auth;
pub mod boletins;
pub mod health;
pub mod internal;
pub mod metrics;
pub mod portal;
pub mod staff;
