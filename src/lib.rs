//! Visuopost: a small server-rendered blog with visitor comments and newsletter signup.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
